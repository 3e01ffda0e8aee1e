//! Buffered multi-channel file logging.
//!
//! Records are appended to per-channel in-memory buffers, flushed on a
//! timer to `<dir>/<YYYY-MM-DD>-<channel>.log`, rotated at every UTC
//! midnight, and deleted once they fall outside a retention window.  The
//! `error`, `debug` and `warning` channels always exist and are mirrored to
//! the console in color.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: resolved settings, optional overrides and TOML loading
//! - **[`logging`]**: the [`Logger`](logging::Logger) facade and its tracing integration
//! - **[`error`]**: typed errors returned when a session cannot be activated
//! - **[`cli`]** and **[`commands`]**: the `daylog` command-line tool
//!
//! ```no_run
//! # async fn demo() -> Result<(), daylog::error::LoggerError> {
//! use daylog::config::LoggerOptions;
//! use daylog::logging::Logger;
//!
//! let log = Logger::new();
//! log.open(LoggerOptions::default().dir("/tmp/log").channels(["access"]))
//!     .await?;
//! log.write("access", "GET /index.html");
//! log.warning("disk low");
//! log.close().await;
//! # Ok(())
//! # }
//! ```
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
