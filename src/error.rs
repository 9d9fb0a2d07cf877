//! Error types for buildsweep
//!
//! A failed build is not an error: it is a [`BuildOutcome::Failure`].
//! These variants cover the faults that stop a project (or the whole batch)
//! from being processed at all.
//!
//! [`BuildOutcome::Failure`]: crate::builder::BuildOutcome::Failure

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for batch build operations
#[derive(Error, Debug)]
pub enum BuildError {
    /// The repository root does not exist or is not a directory
    #[error("Repository root not found: {path}")]
    RootNotFound { path: String },

    /// Failed to spawn the build tool
    #[error("Failed to spawn command: {command}: {error}")]
    SpawnFailed { command: String, error: String },

    /// Writing a build log or result file failed
    #[error("Failed to write {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Wrap an IO error raised while writing `path`
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether `--keep-going` may record this error as a failed build
    /// instead of aborting the batch
    pub fn is_per_project(&self) -> bool {
        matches!(self, BuildError::SpawnFailed { .. })
    }
}
