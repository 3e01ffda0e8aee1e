//! Logger configuration: resolved settings, optional overrides, and loading.
//!
//! [`LoggerConfig`] holds the fully resolved settings of one logger session.
//! [`LoggerOptions`] carries the fields a caller wants to change; every
//! omitted field keeps the value of the previous session (or the built-in
//! default on the first call).  Options can be built in code or loaded from a
//! TOML file with [`load_options`].
pub mod duration;
pub mod toml_loader;

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub use duration::{format_duration, parse_duration};
pub use toml_loader::load_options;

use crate::error::ConfigError;

/// Channel receiving error records.
pub const ERROR_CHANNEL: &str = "error";
/// Channel receiving debug records.
pub const DEBUG_CHANNEL: &str = "debug";
/// Channel receiving warning records.
pub const WARNING_CHANNEL: &str = "warning";

/// Channels that exist in every session and are always mirrored to the console.
pub const BUILTIN_CHANNELS: [&str; 3] = [ERROR_CHANNEL, DEBUG_CHANNEL, WARNING_CHANNEL];

/// Fully resolved settings for one logger session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Channel names; always contains the built-in channels.
    pub channels: Vec<String>,
    /// Directory receiving `<YYYY-MM-DD>-<channel>.log` files.
    pub dir: PathBuf,
    /// Render timestamps in local time instead of UTC.
    pub use_local_time: bool,
    /// Prefix records with `[<pid>]`.
    pub pid: bool,
    /// Channels mirrored to the console; always contains the built-in channels.
    pub stdout: Vec<String>,
    /// Period of each channel's flush timer.
    pub write_interval: Duration,
    /// Capacity hint for the file writer, in bytes.
    pub buffer_size: usize,
    /// Age in days after which dated files are deleted.
    pub keep_days: u32,
    /// Delete zero-byte files when their channel closes.
    pub del_empty: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("log");
        Self {
            channels: builtin_channels(),
            dir,
            use_local_time: true,
            pid: true,
            stdout: builtin_channels(),
            write_interval: Duration::from_secs(3),
            buffer_size: 64 * 1024,
            keep_days: 30,
            del_empty: false,
        }
    }
}

impl LoggerConfig {
    /// Apply `options` on top of this configuration.
    ///
    /// Omitted fields keep their current value.  The built-in channels are
    /// force-added to both the channel list and the console list, and
    /// duplicates are removed while keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if `write_interval` is not a valid, non-zero duration.
    pub fn merge(&self, options: LoggerOptions) -> Result<Self, ConfigError> {
        let write_interval = match options.write_interval.as_deref() {
            Some(text) => parse_duration(text)?,
            None => self.write_interval,
        };
        let channels = options.channels.unwrap_or_else(|| self.channels.clone());
        let stdout = options.stdout.unwrap_or_else(|| self.stdout.clone());
        Ok(Self {
            channels: with_builtins(channels, false),
            dir: options.dir.unwrap_or_else(|| self.dir.clone()),
            use_local_time: options.use_local_time.unwrap_or(self.use_local_time),
            pid: options.pid.unwrap_or(self.pid),
            stdout: with_builtins(stdout, true),
            write_interval,
            buffer_size: options
                .buffer_size_kb
                .map_or(self.buffer_size, |kb| kb.saturating_mul(1024)),
            keep_days: options.keep_days.unwrap_or(self.keep_days),
            del_empty: options.del_empty.unwrap_or(self.del_empty),
        })
    }

    /// Return `true` if records written to `channel` are echoed to the console.
    #[must_use]
    pub fn is_mirrored(&self, channel: &str) -> bool {
        self.stdout.iter().any(|c| c == channel)
    }
}

/// Optional overrides applied by [`LoggerConfig::merge`].
///
/// Deserializes from TOML with the keys listed on each field; unknown keys
/// are rejected so typos surface early.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerOptions {
    /// Channel names (`channels`).
    pub channels: Option<Vec<String>>,
    /// Log directory (`dir`).
    pub dir: Option<PathBuf>,
    /// Local-time timestamps (`use_local_time`).
    pub use_local_time: Option<bool>,
    /// Process id prefix (`pid`).
    pub pid: Option<bool>,
    /// Additional console-mirrored channels (`stdout`).
    pub stdout: Option<Vec<String>>,
    /// Flush period as a duration string (`write_interval`).
    pub write_interval: Option<String>,
    /// File writer capacity in KiB (`buffer_size_kb`).
    pub buffer_size_kb: Option<usize>,
    /// Retention window in days (`keep_days`).
    pub keep_days: Option<u32>,
    /// Delete empty files on close (`del_empty`).
    pub del_empty: Option<bool>,
}

impl LoggerOptions {
    /// Set the channel list.
    #[must_use]
    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the log directory.
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Choose local-time (`true`) or UTC (`false`) timestamps.
    #[must_use]
    pub const fn use_local_time(mut self, local: bool) -> Self {
        self.use_local_time = Some(local);
        self
    }

    /// Enable or disable the `[<pid>]` prefix.
    #[must_use]
    pub const fn pid(mut self, pid: bool) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Set the additional console-mirrored channels.
    #[must_use]
    pub fn stdout<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stdout = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the flush period as a duration string (e.g. `"3s"`).
    #[must_use]
    pub fn write_interval(mut self, interval: impl Into<String>) -> Self {
        self.write_interval = Some(interval.into());
        self
    }

    /// Set the file writer capacity in KiB.
    #[must_use]
    pub const fn buffer_size_kb(mut self, kb: usize) -> Self {
        self.buffer_size_kb = Some(kb);
        self
    }

    /// Set the retention window in days.
    #[must_use]
    pub const fn keep_days(mut self, days: u32) -> Self {
        self.keep_days = Some(days);
        self
    }

    /// Enable or disable deletion of empty files on close.
    #[must_use]
    pub const fn del_empty(mut self, del_empty: bool) -> Self {
        self.del_empty = Some(del_empty);
        self
    }
}

fn builtin_channels() -> Vec<String> {
    BUILTIN_CHANNELS.iter().map(ToString::to_string).collect()
}

/// Deduplicate `names` and add any missing built-in channel, either in front
/// (console list) or at the end (channel list).
fn with_builtins(names: Vec<String>, builtins_first: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len() + BUILTIN_CHANNELS.len());
    let ordered: Box<dyn Iterator<Item = String>> = if builtins_first {
        Box::new(builtin_channels().into_iter().chain(names))
    } else {
        Box::new(names.into_iter().chain(builtin_channels()))
    };
    for name in ordered {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
