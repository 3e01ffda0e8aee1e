//! The logger facade: session lifecycle, channel store, rotation and writes.
use std::collections::HashMap;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use futures::future::join_all;

use super::channel::Channel;
use super::clock::{Clock, SystemClock, next_midnight_delay, utc_day};
use super::format::{
    Origin, Payload, render_console, render_record, report_failure, write_console,
};
use super::retention;
use super::task::BackgroundTask;
use super::utils::{format_timestamp, lock, log_file_path, read, write};
use crate::config::{
    DEBUG_CHANNEL, ERROR_CHANNEL, LoggerConfig, LoggerOptions, WARNING_CHANNEL, format_duration,
};
use crate::error::{ConfigError, LoggerError};

#[derive(Debug)]
struct Shared {
    clock: Arc<dyn Clock>,
    config: RwLock<LoggerConfig>,
    channels: Mutex<HashMap<String, Arc<Channel>>>,
    active: AtomicBool,
    rotation: Mutex<Option<BackgroundTask>>,
    /// Serializes `open`, `close` and `rotate`.
    lifecycle: tokio::sync::Mutex<()>,
}

/// Buffered multi-channel logger with daily rotation and retention.
///
/// A `Logger` is a cheap handle: clones share the same channels and
/// configuration.  Separate [`Logger::new`] calls produce fully isolated
/// instances.
///
/// Records are appended to an in-memory buffer per channel and written to
/// `<dir>/<YYYY-MM-DD>-<channel>.log` by a periodic flush.  At every UTC
/// midnight each channel's file is closed and reopened under the new date,
/// and files older than the retention window are deleted.
///
/// Buffered records are only guaranteed to reach disk once
/// [`close`](Self::close) has completed; dropping the last handle does not
/// flush.
#[derive(Debug, Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create an inactive logger that reads the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an inactive logger that reads `clock` for every date it derives.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                config: RwLock::new(LoggerConfig::default()),
                channels: Mutex::new(HashMap::new()),
                active: AtomicBool::new(false),
                rotation: Mutex::new(None),
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Return `true` between a successful [`open`](Self::open) and [`close`](Self::close).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Return a snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> LoggerConfig {
        read(&self.shared.config).clone()
    }

    /// Apply `options` to the configuration without opening any file.
    ///
    /// Channels that are already open keep their file and flush timer until
    /// the next [`open`](Self::open) or [`rotate`](Self::rotate); record
    /// formatting, console mirroring and retention follow the new settings
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid; the configuration is
    /// then left unchanged.
    pub fn configure(&self, options: LoggerOptions) -> Result<(), ConfigError> {
        let config = read(&self.shared.config).merge(options)?;
        *write(&self.shared.config) = config;
        Ok(())
    }

    /// Return the names of the open channels, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.shared.channels).keys().cloned().collect();
        names.sort();
        names
    }

    /// Return the file currently receiving `channel`'s records.
    #[must_use]
    pub fn channel_path(&self, channel: &str) -> Option<PathBuf> {
        lock(&self.shared.channels)
            .get(channel)
            .map(|c| c.path().to_path_buf())
    }

    /// Apply `options` and (re)open every configured channel.
    ///
    /// Omitted options keep their previous value.  The built-in channels
    /// (`error`, `debug`, `warning`) are always present.  Calling `open` on an
    /// active logger reconfigures it live: each channel's file is flushed and
    /// closed, then reopened under the new settings, and channels no longer
    /// configured are closed.
    ///
    /// On success the logger is active, rotation is scheduled for the next
    /// UTC midnight, and one retention sweep has run.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid, the log directory cannot
    /// be created, or a channel file cannot be opened.  Directory and file
    /// failures are also reported on stderr.  An inactive logger stays
    /// inactive; an active one keeps its previous session when the options or
    /// directory are rejected, and is closed when a channel fails to open.
    pub async fn open(&self, options: LoggerOptions) -> Result<(), LoggerError> {
        self.stop_rotation().await;
        let lifecycle = self.shared.lifecycle.lock().await;
        let activated = self.activate(options).await;
        if self.is_active() {
            self.schedule_rotation();
        }
        drop(lifecycle);
        activated?;

        self.sweep().await;
        Ok(())
    }

    async fn activate(&self, options: LoggerOptions) -> Result<(), LoggerError> {
        let config = read(&self.shared.config).merge(options)?;
        if let Err(source) = tokio::fs::create_dir_all(&config.dir).await {
            let err = LoggerError::CreateDir {
                path: config.dir.clone(),
                source,
            };
            report_failure(&err.to_string());
            tracing::error!(error = %err, "logger not activated");
            return Err(err);
        }

        let stale: Vec<String> = self
            .channel_names()
            .into_iter()
            .filter(|name| !config.channels.contains(name))
            .collect();
        join_all(stale.iter().map(|name| self.close_channel_inner(name))).await;

        let opened = join_all(
            config
                .channels
                .iter()
                .map(|name| self.reopen_channel(name, &config)),
        )
        .await;
        if let Some(err) = opened.into_iter().find_map(Result::err) {
            report_failure(&err.to_string());
            tracing::error!(error = %err, "logger not activated");
            self.shared.active.store(false, Ordering::Release);
            let names = self.channel_names();
            join_all(names.iter().map(|name| self.close_channel_inner(name))).await;
            return Err(err);
        }

        write(&self.shared.config).clone_from(&config);
        self.shared.active.store(true, Ordering::Release);
        tracing::info!(
            dir = %config.dir.display(),
            channels = ?config.channels,
            write_interval = %format_duration(config.write_interval),
            next_rotation_secs = next_midnight_delay(self.shared.clock.now()).as_secs(),
            "logger opened"
        );
        Ok(())
    }

    /// Flush and close every channel and deactivate the logger.
    ///
    /// No-op when the logger is not active.  Writes issued after `close`
    /// starts are dropped.  When this returns, the channel store is empty,
    /// every file is closed and no timer is pending.
    pub async fn close(&self) {
        if !self.shared.active.swap(false, Ordering::AcqRel) {
            return;
        }
        self.stop_rotation().await;
        let _lifecycle = self.shared.lifecycle.lock().await;
        self.shared.active.store(false, Ordering::Release);
        if let Some(rotation) = lock(&self.shared.rotation).take() {
            rotation.cancel();
        }

        let names = self.channel_names();
        join_all(names.iter().map(|name| self.close_channel_inner(name))).await;
        tracing::info!(channels = names.len(), "logger closed");
    }

    /// Flush and close a single channel.
    ///
    /// The channel stays closed until the next [`open`](Self::open); writes to
    /// it are dropped meanwhile.  No-op for unknown channels.
    pub async fn close_channel(&self, channel: &str) {
        let _lifecycle = self.shared.lifecycle.lock().await;
        self.close_channel_inner(channel).await;
    }

    /// Append `message` to `channel`.
    ///
    /// Never fails and never blocks on I/O: the record is buffered until the
    /// channel's next flush.  Calls for channels that are not open, or on an
    /// inactive logger, are silently dropped.  Mirrored channels are also
    /// echoed to stdout before this returns; `debug` records additionally
    /// show the caller's source location there.
    #[track_caller]
    pub fn write(&self, channel: &str, message: impl Into<Payload>) {
        let caller = Location::caller();
        self.emit(channel, &message.into(), Some(Origin::from(caller)));
    }

    /// Append a record whose console origin is already known.
    pub(super) fn emit(&self, channel: &str, payload: &Payload, origin: Option<Origin<'_>>) {
        if !self.is_active() {
            return;
        }
        let (local_time, pid, mirrored) = {
            let config = read(&self.shared.config);
            (config.use_local_time, config.pid, config.is_mirrored(channel))
        };

        let timestamp = format_timestamp(self.shared.clock.now(), local_time);
        let record = render_record(&timestamp, pid.then(std::process::id), &payload.render());
        // Appending under the store lock orders every record before the
        // removal that precedes a channel's final drain.
        let appended = lock(&self.shared.channels)
            .get(channel)
            .map(|target| target.append(&record))
            .is_some();
        if !appended {
            return;
        }
        if mirrored {
            write_console(&render_console(channel, &record, origin));
        }
    }

    /// Write to the `error` channel.
    #[track_caller]
    pub fn error(&self, message: impl Into<Payload>) {
        self.write(ERROR_CHANNEL, message);
    }

    /// Write to the `warning` channel.
    #[track_caller]
    pub fn warning(&self, message: impl Into<Payload>) {
        self.write(WARNING_CHANNEL, message);
    }

    /// Write to the `debug` channel.
    #[track_caller]
    pub fn debug(&self, message: impl Into<Payload>) {
        self.write(DEBUG_CHANNEL, message);
    }

    /// Write `channel`'s buffered records to its file now.
    ///
    /// No-op for unknown channels, empty buffers, or while another write to
    /// the same channel is in flight (the records stay buffered).
    pub async fn flush(&self, channel: &str) {
        let target = lock(&self.shared.channels).get(channel).cloned();
        if let Some(target) = target {
            target.flush().await;
        }
    }

    /// Flush every open channel.
    pub async fn flush_all(&self) {
        let channels: Vec<Arc<Channel>> = lock(&self.shared.channels).values().cloned().collect();
        join_all(channels.iter().map(|c| c.flush())).await;
    }

    /// Close and reopen every open channel under the current date.
    ///
    /// This is what the midnight timer runs.  Each channel's previous file is
    /// fully flushed and closed before its new file is opened.  No-op when
    /// the logger is not active.
    pub async fn rotate(&self) {
        let _lifecycle = self.shared.lifecycle.lock().await;
        if !self.is_active() {
            return;
        }
        let config = self.config();
        let names = self.channel_names();
        let reopened = join_all(names.iter().map(|name| self.reopen_channel(name, &config))).await;
        for err in reopened.into_iter().filter_map(Result::err) {
            tracing::warn!(error = %err, "channel not reopened after rotation");
        }
        tracing::info!(channels = names.len(), "log files rotated");
    }

    /// Delete log files older than the retention window.
    ///
    /// Returns the number of files deleted.  Failures are ignored.
    pub async fn sweep(&self) -> usize {
        let (dir, keep_days) = {
            let config = read(&self.shared.config);
            (config.dir.clone(), config.keep_days)
        };
        let today = utc_day(self.shared.clock.now());
        let deleted = retention::sweep(&dir, keep_days, today).await;
        if deleted > 0 {
            tracing::info!(dir = %dir.display(), deleted, "expired log files removed");
        }
        deleted
    }

    /// Close `name`'s current file, then open its file under `config`.
    ///
    /// The channel stays in the store while its old file closes.  Records
    /// written meanwhile are carried over into the new channel, so a reopen
    /// never drops a write and never holds two files for one channel.
    async fn reopen_channel(&self, name: &str, config: &LoggerConfig) -> Result<(), LoggerError> {
        let previous = lock(&self.shared.channels).get(name).cloned();
        if let Some(previous) = &previous {
            self.retire(previous).await;
        }

        let path = log_file_path(&config.dir, name, self.shared.clock.now());
        let channel = match Channel::open(name, path.clone(), config.buffer_size).await {
            Ok(channel) => channel,
            Err(source) => {
                if previous.is_some() {
                    self.discard(name);
                }
                return Err(LoggerError::OpenChannel {
                    channel: name.to_string(),
                    path,
                    source,
                });
            }
        };
        channel.start_timer(config.write_interval);
        tracing::debug!(channel = name, path = %path.display(), "channel opened");

        let mut channels = lock(&self.shared.channels);
        if let Some(previous) = &previous {
            channel.append(&previous.take_pending());
        }
        channels.insert(name.to_string(), channel);
        drop(channels);
        Ok(())
    }

    async fn close_channel_inner(&self, name: &str) {
        let removed = lock(&self.shared.channels).remove(name);
        if let Some(channel) = removed {
            self.retire(&channel).await;
        }
    }

    /// Flush and close `channel`'s file.
    async fn retire(&self, channel: &Channel) {
        if !channel.close().await {
            return;
        }
        let del_empty = read(&self.shared.config).del_empty;
        remove_if_empty(channel.path(), del_empty).await;
        tracing::debug!(channel = channel.name(), "channel closed");
    }

    /// Drop a closed channel whose file could not be reopened.
    fn discard(&self, name: &str) {
        let removed = lock(&self.shared.channels).remove(name);
        let lost = removed.map_or(0, |channel| channel.take_pending().len());
        if lost > 0 {
            tracing::warn!(channel = name, bytes = lost, "buffered records dropped");
        }
    }

    fn schedule_rotation(&self) {
        let rotation = self.spawn_rotation();
        if let Some(previous) = lock(&self.shared.rotation).replace(rotation) {
            previous.cancel();
        }
    }

    fn spawn_rotation(&self) -> BackgroundTask {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        BackgroundTask::spawn(|mut stop| async move {
            loop {
                let Some((day, delay)) = weak.upgrade().map(|shared| {
                    let now = shared.clock.now();
                    (utc_day(now), next_midnight_delay(now))
                }) else {
                    break;
                };
                tokio::select! {
                    _ = &mut stop => break,
                    () = tokio::time::sleep(delay) => {}
                }
                let Some(shared) = weak.upgrade() else { break };
                if utc_day(shared.clock.now()) == day {
                    continue;
                }
                let logger = Self { shared };
                logger.rotate().await;
                logger.sweep().await;
            }
        })
    }

    async fn stop_rotation(&self) {
        let rotation = lock(&self.shared.rotation).take();
        if let Some(rotation) = rotation {
            rotation.stop().await;
        }
    }

    /// Return `true` while a rotation task is scheduled (test-only).
    #[cfg(test)]
    fn has_rotation(&self) -> bool {
        lock(&self.shared.rotation).is_some()
    }

    /// Return the open channel named `name` (test-only).
    #[cfg(test)]
    fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        lock(&self.shared.channels).get(name).cloned()
    }
}

/// Delete `path` if it is empty and `del_empty` is set; failures are ignored.
async fn remove_if_empty(path: &Path, del_empty: bool) {
    if !del_empty {
        return;
    }
    let len = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "log file not inspected");
            return;
        }
    };
    if len > 0 {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(path = %path.display(), error = %e, "empty log file not removed");
        return;
    }
    tracing::debug!(path = %path.display(), "removed empty log file");
}
