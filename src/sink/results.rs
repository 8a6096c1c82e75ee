//! Numbered text result files.

use crate::types::{AggregateReport, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes each result to `<dir>/result<N>.txt`.
///
/// `N` starts at the number of entries already in the directory, so results
/// accumulate across runs.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one result, creating the directory if needed.
    pub fn write(&self, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let mut index = fs::read_dir(&self.dir)?.count();
        let path = loop {
            let candidate = self.dir.join(format!("result{}.txt", index));
            if !candidate.exists() {
                break candidate;
            }
            index += 1;
        };

        fs::write(&path, text)?;
        debug!("Result written to {:?}", path);
        Ok(path)
    }
}

/// Serialize a batch of reports for `--json` and `--output`.
pub fn reports_json(reports: &[AggregateReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}
