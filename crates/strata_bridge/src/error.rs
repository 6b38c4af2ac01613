//! Error type for the bridge pipeline.
//!
//! Configuration problems are caught before any pass starts. I/O and tool
//! failures abort the current domain pass. Violations of the structural
//! contract the host design must uphold (single driver, recognized primitive
//! catalogue) are panics, not errors; they indicate a caller bug.

use std::path::PathBuf;
use strata_blif::BlifError;
use thiserror::Error;

/// Convenience alias used throughout the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by the bridge pipeline.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid or conflicting options, rejected before any pass starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The external optimizer exited with a non-zero status.
    #[error("optimizer command \"{command}\" failed with exit code {code}")]
    ToolFailed {
        /// The full shell command line.
        command: String,
        /// The exit code.
        code: i32,
    },

    /// The optimizer's output file could not be parsed.
    #[error(transparent)]
    Blif(#[from] BlifError),
}

impl BridgeError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BridgeError::Io {
            path: path.into(),
            source,
        }
    }
}
