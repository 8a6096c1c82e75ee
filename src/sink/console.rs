//! Colored console output for reports.

use crate::types::{AggregateReport, Presence, ReportEntry};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
    quiet: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool, quiet: bool) -> Self {
        Self { verbose, json_mode, quiet }
    }

    pub fn print_banner(&self) {
        if self.json_mode || self.quiet {
            return;
        }
        println!("{}", "Welcome to passive".bright_cyan().bold());
    }

    /// Print info message.
    pub fn print_info(&self, message: &str) {
        if self.json_mode || self.quiet {
            return;
        }

        println!("{} {}", "[*]".bright_blue(), message);
    }

    /// Print plain lookup output.
    pub fn print_text(&self, text: &str) {
        if self.json_mode {
            return;
        }
        println!("{}", text);
    }

    /// Print one aggregate report.
    pub fn print_report(&self, report: &AggregateReport) {
        if self.json_mode {
            return;
        }
        if self.quiet && report.present_count() == 0 {
            return;
        }

        println!();
        println!(
            "{} {}",
            "===".bright_cyan(),
            report.identity.bright_white().bold()
        );
        for entry in &report.entries {
            println!("  {}", format_entry(entry, self.verbose));
        }

        if self.verbose {
            println!(
                "  {}",
                format!("checked as '{}' in {:.2}s", report.normalized, report.duration_secs).dimmed()
            );
        }
    }

    /// Print a summary across several reports.
    pub fn print_summary(&self, reports: &[AggregateReport]) {
        if self.json_mode || reports.len() < 2 {
            return;
        }

        let found = reports.iter().filter(|r| r.present_count() > 0).count();
        println!();
        println!("{}", "=== Summary ===".bright_cyan());
        println!("  Checked:  {}", reports.len());
        println!("  Found:    {}", found.to_string().green());
    }

    /// Create a progress bar.
    pub fn create_progress_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.json_mode || total < 2 {
            return None;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        Some(pb)
    }
}

/// Format one provider line with color.
fn format_entry(entry: &ReportEntry, verbose: bool) -> String {
    let value = match entry.presence {
        Presence::Present => entry.reported.to_string().green().bold(),
        Presence::Absent => entry.reported.to_string().dimmed(),
        Presence::Indeterminate => format!("{} (indeterminate)", entry.reported).yellow(),
    };

    let mut line = format!("- {}: {}", entry.provider, value);
    if verbose {
        if let Some(ref fault) = entry.fault {
            line.push_str(&format!(" {}", format!("[{}]", fault).dimmed()));
        }
    }
    line
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false, false, false)
    }
}
