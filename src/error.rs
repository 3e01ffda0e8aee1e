//! Domain-specific error types for the daylog engine.
//!
//! Library operations that can fail in a way the caller must know about
//! (activation of a logger session, configuration parsing) return the typed
//! errors below.  The binary converts them to [`anyhow::Error`] at the
//! command boundary via the standard `?` operator.
//!
//! Writing, flushing, rotating and sweeping never return errors: logging is
//! best-effort and must not interrupt the host program.
//!
//! # Error hierarchy
//!
//! ```text
//! LoggerError
//! ├── Config       — options could not be applied
//! ├── CreateDir    — log directory could not be created
//! └── OpenChannel  — a channel file could not be opened
//! ConfigError
//! ├── InvalidDuration
//! └── ZeroDuration
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a logger session from becoming active.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The supplied options are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The log directory (or one of its parents) could not be created.
    #[error("Failed to create log directory {}: {source}", .path.display())]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A channel's file could not be opened for appending.
    #[error("Failed to open log file for channel '{channel}' at {}: {source}", .path.display())]
    OpenChannel {
        /// Channel name.
        channel: String,
        /// Path of the file that could not be opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while interpreting configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration string could not be parsed (e.g. `"3x"`).
    #[error("Invalid duration '{0}': expected <number><unit> with unit ms, s, m, h or d")]
    InvalidDuration(String),

    /// A duration parsed to zero, which cannot drive a periodic timer.
    #[error("Duration must be greater than zero")]
    ZeroDuration,
}
