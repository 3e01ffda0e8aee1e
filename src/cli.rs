//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::LoggerOptions;

/// Top-level CLI entry point for the daylog tool.
#[derive(Parser, Debug)]
#[command(
    name = "daylog",
    about = "Buffered multi-channel file logger with daily rotation",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write each line read from stdin to a log channel
    Pipe(PipeOpts),
    /// Delete log files older than the retention window
    Sweep(SweepOpts),
    /// Print version information
    Version,
}

/// Options for locating the log directory, shared by every subcommand that
/// touches it.
#[derive(Args, Debug, Clone, Default)]
pub struct DirOpts {
    /// TOML file with logger options; command-line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory receiving the log files
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Days a dated log file is kept
    #[arg(long)]
    pub keep_days: Option<u32>,
}

impl DirOpts {
    /// Overlay these flags on `options`.
    #[must_use]
    pub fn apply(&self, mut options: LoggerOptions) -> LoggerOptions {
        if let Some(dir) = &self.dir {
            options = options.dir(dir);
        }
        if let Some(days) = self.keep_days {
            options = options.keep_days(days);
        }
        options
    }
}

/// Options for the `pipe` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PipeOpts {
    /// Log directory options
    #[command(flatten)]
    pub dir: DirOpts,

    /// Channel receiving the piped lines
    #[arg(long, default_value = "debug")]
    pub channel: String,

    /// Additional channels mirrored to stdout
    #[arg(long, value_delimiter = ',')]
    pub stdout: Vec<String>,

    /// Flush period, e.g. 500ms, 3s or 1m
    #[arg(long)]
    pub write_interval: Option<String>,

    /// Delete zero-byte log files on close
    #[arg(long)]
    pub del_empty: bool,

    /// Omit the process id from records
    #[arg(long)]
    pub no_pid: bool,

    /// Render timestamps in UTC instead of local time
    #[arg(long)]
    pub utc: bool,
}

impl PipeOpts {
    /// Overlay these flags on `options`.
    ///
    /// Flags left at their default do not override the file's settings.
    #[must_use]
    pub fn apply(&self, options: LoggerOptions) -> LoggerOptions {
        let mut options = self.dir.apply(options);
        let mut channels = options.channels.take().unwrap_or_default();
        if !channels.contains(&self.channel) {
            channels.push(self.channel.clone());
        }
        options = options.channels(channels);
        if !self.stdout.is_empty() {
            options = options.stdout(self.stdout.iter().cloned());
        }
        if let Some(interval) = &self.write_interval {
            options = options.write_interval(interval.clone());
        }
        if self.del_empty {
            options = options.del_empty(true);
        }
        if self.no_pid {
            options = options.pid(false);
        }
        if self.utc {
            options = options.use_local_time(false);
        }
        options
    }
}

/// Options for the `sweep` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SweepOpts {
    /// Log directory options
    #[command(flatten)]
    pub dir: DirOpts,
}
