//! Command: run one retention sweep over a log directory.
use std::io::Write as _;

use anyhow::Result;

use crate::cli::SweepOpts;
use crate::logging::Logger;

/// Delete expired log files and report how many were removed.
///
/// No channel is opened, so the directory is left untouched apart from the
/// deletions.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be loaded or holds
/// invalid options.
pub async fn run(opts: &SweepOpts) -> Result<usize> {
    let options = opts.dir.apply(super::file_options(&opts.dir)?);
    let log = Logger::new();
    log.configure(options)?;

    let deleted = log.sweep().await;
    let dir = log.config().dir;
    writeln!(
        std::io::stdout().lock(),
        "removed {deleted} expired log file(s) from {}",
        dir.display()
    )
    .ok();
    Ok(deleted)
}
