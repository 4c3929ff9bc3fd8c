//! Error types for clawsweep
//!
//! This module defines all error types used throughout the sweep runner,
//! from prompt refusals to solver and worker failures.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Main error type for sweep operations
#[derive(Error, Debug)]
pub enum SweepError {
    /// The user declined a confirmation prompt
    #[error("*** Aborting: {0}")]
    Aborted(String),

    /// Operation cancelled by an interrupt or termination signal
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A case is missing a key or holds the wrong type for it
    #[error("Invalid case: key '{key}' {message}")]
    InvalidCase { key: String, message: String },

    /// I/O error during directory or file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The per-case log file could not be opened
    #[error("Cannot open log file '{path}': {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Producing or writing the run configuration failed
    #[error("Run configuration error: {0}")]
    RunConfig(String),

    /// The solver build step failed
    #[error("Build of solver executable failed ({status})")]
    Build { status: ExitStatus },

    /// The solver executable exited unsuccessfully
    #[error("Solver '{program}' failed in '{outdir}' ({status})")]
    Solver {
        program: String,
        outdir: PathBuf,
        status: ExitStatus,
    },

    /// The plotting command exited unsuccessfully
    #[error("Plotting '{program}' failed for '{outdir}' ({status})")]
    Plot {
        program: String,
        outdir: PathBuf,
        status: ExitStatus,
    },

    /// A worker process could not be started
    #[error("Failed to spawn worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    /// Polling or signalling a running worker failed
    #[error("Lost track of worker {worker}: {source}")]
    WorkerIo {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    /// Malformed data on the parent/worker channel
    #[error("Worker protocol error: {0}")]
    WorkerProtocol(String),

    /// One or more workers exited unsuccessfully
    #[error("{} of {total} workers failed: {}", .failed.len(), format_workers(.failed))]
    WorkersFailed { failed: Vec<usize>, total: usize },
}

fn format_workers(ids: &[usize]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SweepError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid-case error
    pub fn invalid_case(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCase {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from the user declining or interrupting
    pub fn is_user_stop(&self) -> bool {
        matches!(self, Self::Aborted(_) | Self::Cancelled)
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::LogFile { path, .. } => Some(path),
            Self::Solver { outdir, .. } | Self::Plot { outdir, .. } => Some(outdir),
            _ => None,
        }
    }
}

/// Result type alias for sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::WorkerProtocol(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SweepError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Result<()> = std::io::Result::<()>::Err(io_err).with_path("/runs/_output_beta20");
        let err = err.unwrap_err();
        assert_eq!(err.path().unwrap(), &PathBuf::from("/runs/_output_beta20"));
        assert!(err.to_string().contains("_output_beta20"));
    }

    #[test]
    fn test_user_stop() {
        assert!(SweepError::Cancelled.is_user_stop());
        assert!(SweepError::Aborted("declined".into()).is_user_stop());
        assert!(!SweepError::config("bad").is_user_stop());
    }

    #[test]
    fn test_workers_failed_message() {
        let err = SweepError::WorkersFailed {
            failed: vec![0, 3],
            total: 4,
        };
        assert_eq!(err.to_string(), "2 of 4 workers failed: 0, 3");
    }
}
