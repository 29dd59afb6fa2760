//! Error types for patchscan-pkg

use std::time::Duration;

use thiserror::Error;

use crate::family::OsFamily;

/// Errors that can occur while querying a package manager
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The package manager exited with a non-zero status
    #[error("command failed: {status} - {stderr}")]
    CommandFailed {
        /// Exit status
        status: i32,
        /// Trimmed stderr of the command
        stderr: String,
    },

    /// The command could not be run at all
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// Failed to parse command output
    #[error("parse error: {0}")]
    ParseError(String),

    /// The dpkg lock stayed held past the configured bound
    #[error("dpkg lock still held after {0:?}")]
    LockTimeout(Duration),

    /// No fetcher exists for the detected OS family
    #[error("unsupported OS family: {0}")]
    Unsupported(OsFamily),
}

impl FetchError {
    /// Whether the error only means there is no fetcher for this host
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, FetchError::Unsupported(_))
    }
}
