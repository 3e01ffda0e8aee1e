//! Top-level subcommand orchestration.
pub mod pipe;
pub mod sweep;
pub mod version;

use anyhow::Result;

use crate::cli::{Command, DirOpts};
use crate::config::{self, LoggerOptions};

/// Run `command` to completion.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the logger
/// cannot be activated.
pub async fn run(command: &Command) -> Result<()> {
    match command {
        Command::Pipe(opts) => pipe::run(opts).await,
        Command::Sweep(opts) => sweep::run(opts).await.map(|_| ()),
        Command::Version => {
            version::run();
            Ok(())
        }
    }
}

/// Load the options file named by `--config`, or defaults without one.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn file_options(opts: &DirOpts) -> Result<LoggerOptions> {
    opts.config
        .as_deref()
        .map_or_else(|| Ok(LoggerOptions::default()), config::load_options)
}
