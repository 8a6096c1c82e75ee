//! passive - Passive identity presence checker.
//!
//! CLI entry point.

use clap::Parser;
use passive::lookup::{IpLocator, PersonDatabase};
use passive::sink::{reports_json, ConsoleOutput, ResultWriter};
use passive::{normalize, Aggregator, Commands, Config, FullName, IpConfig, NameConfig, UserConfig};
use std::fs;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("passive=debug,info")
    } else {
        EnvFilter::new("passive=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let outcome = match config.command.clone() {
        Commands::User(user_config) => run_user(user_config, &config).await,
        Commands::Name(name_config) => run_name(name_config, &config),
        Commands::Ip(ip_config) => run_ip(ip_config, &config).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

async fn run_user(user_config: UserConfig, global_config: &Config) -> Result<(), ExitCode> {
    let identities = match user_config.load_identities() {
        Ok(ids) => ids,
        Err(e) => {
            error!("Failed to load usernames: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let (identities, rejected): (Vec<String>, Vec<String>) = identities
        .into_iter()
        .partition(|id| !normalize(id).is_empty());
    for id in &rejected {
        error!("Skipping '{}': nothing left after removing the handle marker", id);
    }

    if identities.is_empty() {
        error!("No usernames specified. Use positional arguments or -f <file>.");
        return Err(ExitCode::FAILURE);
    }

    let settings = global_config.probe_settings(&user_config);
    if settings.youtube_api_key.is_none() {
        info!("No YouTube API key configured; YouTube results will be indeterminate");
    }

    let aggregator = match Aggregator::new(&settings) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to create aggregator: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let console = ConsoleOutput::new(global_config.verbose, user_config.json, user_config.quiet);
    console.print_banner();
    console.print_info("Processing username search...");

    let pb = console.create_progress_bar(identities.len() as u64, "Checking usernames");
    let reports = aggregator
        .check_multiple_with(&identities, user_config.parallel, |_| {
            if let Some(ref pb) = pb {
                pb.inc(1);
            }
        })
        .await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let writer = ResultWriter::new(&user_config.results_dir);
    for report in &reports {
        console.print_report(report);
        if !user_config.no_save {
            if let Err(e) = writer.write(&report.render()) {
                error!("Failed to write result for '{}': {}", report.identity, e);
            }
        }
    }
    console.print_summary(&reports);

    if user_config.json || user_config.output.is_some() {
        let json = match reports_json(&reports) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize results: {}", e);
                return Err(ExitCode::FAILURE);
            }
        };
        if let Some(ref output_path) = user_config.output {
            if let Err(e) = fs::write(output_path, &json) {
                error!("Failed to write output file: {}", e);
                return Err(ExitCode::FAILURE);
            }
            info!("Results written to: {:?}", output_path);
        } else {
            println!("{}", json);
        }
    }

    Ok(())
}

fn run_name(name_config: NameConfig, global_config: &Config) -> Result<(), ExitCode> {
    let console = ConsoleOutput::new(global_config.verbose, false, false);
    console.print_banner();
    console.print_info("Processing full name search...");

    let raw = name_config.name.join(" ");
    let name = match FullName::parse(&raw) {
        Ok(n) => n,
        Err(e) => {
            error!("{}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let database = match PersonDatabase::load(&name_config.database) {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to read database {:?}: {}", name_config.database, e);
            return Err(ExitCode::FAILURE);
        }
    };

    let Some(person) = database.find(&name) else {
        console.print_text(&format!("No data with name {}.", name));
        return Ok(());
    };

    let text = person.render();
    console.print_text(&text);
    if !name_config.no_save {
        save(&name_config.results_dir, &text)?;
    }
    Ok(())
}

async fn run_ip(ip_config: IpConfig, global_config: &Config) -> Result<(), ExitCode> {
    let console = ConsoleOutput::new(global_config.verbose, false, false);
    console.print_banner();
    console.print_info("Processing IP search...");

    let locator = match IpLocator::new(&global_config.http_settings()) {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to create IP locator: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let info = match locator.locate(&ip_config.address).await {
        Ok(info) => info,
        Err(e) => {
            error!("IP lookup failed: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let text = info.render();
    console.print_text(&text);
    if !ip_config.no_save {
        save(&ip_config.results_dir, &text)?;
    }
    Ok(())
}

fn save(dir: &std::path::Path, text: &str) -> Result<(), ExitCode> {
    match ResultWriter::new(dir).write(text) {
        Ok(path) => {
            info!("Result written to: {:?}", path);
            Ok(())
        }
        Err(e) => {
            error!("Failed to write result: {}", e);
            Err(ExitCode::FAILURE)
        }
    }
}
