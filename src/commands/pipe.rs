//! Command: forward stdin lines into a log channel.
use anyhow::{Context as _, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, BufReader};

use crate::cli::PipeOpts;
use crate::logging::Logger;

/// Open a logger, write each stdin line to the selected channel, and close
/// it on end of input or Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the logger cannot be
/// opened, or stdin cannot be read.  The logger is closed in every case.
pub async fn run(opts: &PipeOpts) -> Result<()> {
    let options = opts.apply(super::file_options(&opts.dir)?);
    let log = Logger::new();
    log.open(options).await?;

    let input = BufReader::new(tokio::io::stdin());
    let outcome = tokio::select! {
        result = forward(&log, &opts.channel, input) => result.map(|lines| {
            tracing::debug!(lines, channel = %opts.channel, "end of input");
        }),
        signal = tokio::signal::ctrl_c() => {
            tracing::debug!(channel = %opts.channel, "interrupted");
            signal.context("Failed to listen for Ctrl-C")
        }
    };

    log.close().await;
    outcome
}

/// Write every line of `input` to `channel` and return how many were read.
///
/// # Errors
///
/// Returns an error if reading from `input` fails; lines read before the
/// failure have already been written.
pub async fn forward<R>(log: &Logger, channel: &str, input: R) -> Result<usize>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut lines = input.lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        log.write(channel, line);
        count += 1;
    }
    Ok(count)
}
