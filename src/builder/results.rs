//! Build outcomes and the append-only result files

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ResultsConfig;
use crate::error::BuildError;

/// Binary build outcome derived from the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildOutcome {
    Successful,
    Failure,
}

impl BuildOutcome {
    /// `Some(0)` is success; any other code, or none at all, is failure
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => BuildOutcome::Successful,
            _ => BuildOutcome::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Successful)
    }

    /// Status wording used in progress and result lines
    pub fn status(&self) -> &'static str {
        match self {
            BuildOutcome::Successful => "BUILD SUCCESSFUL",
            BuildOutcome::Failure => "BUILD FAILED",
        }
    }
}

/// Running counters for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Repositories in the batch
    pub total: usize,
    /// Repositories dispatched so far
    pub attempted: usize,
    /// Successful builds so far
    pub successful: usize,
}

impl Tally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: BuildOutcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.successful += 1;
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.successful
    }
}

/// The pair of append-only result files
#[derive(Debug, Clone)]
pub struct ResultLog {
    success_path: PathBuf,
    failure_path: PathBuf,
}

impl ResultLog {
    pub fn new(success_path: impl Into<PathBuf>, failure_path: impl Into<PathBuf>) -> Self {
        Self {
            success_path: success_path.into(),
            failure_path: failure_path.into(),
        }
    }

    pub fn from_config(config: &ResultsConfig) -> Self {
        Self::new(&config.success_file, &config.failure_file)
    }

    /// File that receives lines for `outcome`
    pub fn path_for(&self, outcome: BuildOutcome) -> &Path {
        match outcome {
            BuildOutcome::Successful => &self.success_path,
            BuildOutcome::Failure => &self.failure_path,
        }
    }

    /// Append one line to the file for `outcome`, creating it if needed
    pub fn append(&self, outcome: BuildOutcome, line: &str) -> Result<(), BuildError> {
        let path = self.path_for(outcome);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| BuildError::write_failed(path, e))?;

        writeln!(file, "{}", line).map_err(|e| BuildError::write_failed(path, e))
    }
}
