//! Per-channel state: record buffer, write lock, file handle and flush timer.
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt as _, BufWriter};
use tokio::time::{Instant, MissedTickBehavior};

use super::task::BackgroundTask;
use super::utils::lock;

/// Holds a channel's write lock; released on drop so that a cancelled flush
/// never leaves the channel locked.
struct WriteLock<'a>(&'a AtomicBool);

impl<'a> WriteLock<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for WriteLock<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One open log stream.
///
/// Records accumulate in `buffer` in call order.  A flush swaps the buffer
/// for an empty one and writes the taken records while holding the write
/// lock, so at most one write per channel is in flight and records appended
/// meanwhile land in the fresh buffer.
#[derive(Debug)]
pub(super) struct Channel {
    name: String,
    path: PathBuf,
    buffer: Mutex<String>,
    writing: AtomicBool,
    file: tokio::sync::Mutex<Option<BufWriter<File>>>,
    timer: Mutex<Option<BackgroundTask>>,
}

impl Channel {
    /// Open (or create) `path` in append mode.
    ///
    /// `capacity` sizes the file writer's internal buffer; it is a hint, not
    /// a cap on how much may be buffered in memory.
    pub(super) async fn open(name: &str, path: PathBuf, capacity: usize) -> io::Result<Arc<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Arc::new(Self {
            name: name.to_string(),
            path,
            buffer: Mutex::new(String::new()),
            writing: AtomicBool::new(false),
            file: tokio::sync::Mutex::new(Some(BufWriter::with_capacity(capacity.max(1), file))),
            timer: Mutex::new(None),
        }))
    }

    pub(super) fn name(&self) -> &str {
        &self.name
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Start flushing every `period` until the channel is closed or dropped.
    pub(super) fn start_timer(self: &Arc<Self>, period: Duration) {
        let channel = Arc::downgrade(self);
        let task = BackgroundTask::spawn(|mut stop| async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        let Some(channel) = channel.upgrade() else { break };
                        channel.flush().await;
                    }
                }
            }
        });
        if let Some(previous) = lock(&self.timer).replace(task) {
            previous.cancel();
        }
    }

    /// Append a formatted record to the buffer.
    pub(super) fn append(&self, record: &str) {
        lock(&self.buffer).push_str(record);
    }

    /// Take every buffered, not yet written record.
    pub(super) fn take_pending(&self) -> String {
        std::mem::take(&mut *lock(&self.buffer))
    }

    /// Return the number of buffered, not yet written bytes.
    #[cfg(test)]
    pub(super) fn pending_len(&self) -> usize {
        lock(&self.buffer).len()
    }

    /// Return `true` while the flush timer is installed.
    #[cfg(test)]
    pub(super) fn has_timer(&self) -> bool {
        lock(&self.timer).is_some()
    }

    /// Write buffered records to the file.
    ///
    /// No-op when the buffer is empty, when another write is in flight, or
    /// when the file has already been closed; the buffered records are kept
    /// in every case.
    pub(super) async fn flush(&self) {
        let Some(_write_lock) = WriteLock::acquire(&self.writing) else {
            return;
        };
        if lock(&self.buffer).is_empty() {
            return;
        }
        let mut file = self.file.lock().await;
        let Some(writer) = file.as_mut() else {
            return;
        };
        let pending = self.take_pending();
        if let Err(e) = write_records(writer, &pending).await {
            tracing::warn!(
                channel = %self.name,
                path = %self.path.display(),
                error = %e,
                bytes = pending.len(),
                "failed to write log records"
            );
        }
    }

    /// Stop the flush timer, write out everything still buffered, and
    /// release the file.
    ///
    /// Waits for an in-flight write to finish first.  Returns `false` if the
    /// file had already been closed.
    pub(super) async fn close(&self) -> bool {
        let timer = lock(&self.timer).take();
        if let Some(timer) = timer {
            timer.stop().await;
        }

        let Some(mut writer) = self.file.lock().await.take() else {
            return false;
        };
        let pending = self.take_pending();
        let result = async {
            if !pending.is_empty() {
                writer.write_all(pending.as_bytes()).await?;
            }
            writer.shutdown().await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(
                channel = %self.name,
                path = %self.path.display(),
                error = %e,
                "failed to close log file"
            );
        }
        true
    }
}

async fn write_records(writer: &mut BufWriter<File>, records: &str) -> io::Result<()> {
    writer.write_all(records.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn open_in(tmp: &tempfile::TempDir, name: &str) -> Arc<Channel> {
        let path = tmp.path().join(format!("2024-03-09-{name}.log"));
        Channel::open(name, path, 64 * 1024).await.expect("open channel")
    }

    #[tokio::test]
    async fn flush_writes_records_in_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let channel = open_in(&tmp, "access").await;
        channel.append("one\n");
        channel.append("two\n");
        channel.flush().await;
        channel.append("three\n");
        channel.flush().await;
        let contents = std::fs::read_to_string(channel.path()).unwrap();
        assert_eq!(contents, "one\ntwo\nthree\n");
        assert_eq!(channel.pending_len(), 0);
    }

    #[tokio::test]
    async fn flush_is_noop_while_locked() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let channel = open_in(&tmp, "access").await;
        channel.append("held\n");
        let held = WriteLock::acquire(&channel.writing).expect("lock is free");
        channel.flush().await;
        assert_eq!(channel.pending_len(), 5, "records stay buffered");
        assert_eq!(std::fs::read_to_string(channel.path()).unwrap(), "");
        drop(held);
        channel.flush().await;
        assert_eq!(std::fs::read_to_string(channel.path()).unwrap(), "held\n");
    }

    #[tokio::test]
    async fn write_lock_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = WriteLock::acquire(&flag);
        assert!(first.is_some());
        assert!(WriteLock::acquire(&flag).is_none());
        drop(first);
        assert!(WriteLock::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn close_drains_buffer_and_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let channel = open_in(&tmp, "audit").await;
        channel.append("last words\n");
        assert!(channel.close().await);
        assert!(!channel.close().await, "second close reports already closed");
        let contents = std::fs::read_to_string(channel.path()).unwrap();
        assert_eq!(contents, "last words\n");
    }

    #[tokio::test]
    async fn flush_after_close_keeps_records() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let channel = open_in(&tmp, "audit").await;
        channel.close().await;
        channel.append("late\n");
        channel.flush().await;
        assert_eq!(channel.pending_len(), 5);
    }

    #[tokio::test]
    async fn timer_flushes_periodically_and_stops_on_close() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let channel = open_in(&tmp, "access").await;
        channel.start_timer(Duration::from_millis(20));
        channel.append("tick\n");
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(std::fs::read_to_string(channel.path()).unwrap(), "tick\n");
        assert!(channel.has_timer());
        channel.close().await;
        assert!(!channel.has_timer());
    }

    #[tokio::test]
    async fn reopening_appends_to_existing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let first = open_in(&tmp, "access").await;
        first.append("before\n");
        first.close().await;
        let second = open_in(&tmp, "access").await;
        second.append("after\n");
        second.close().await;
        let contents = std::fs::read_to_string(second.path()).unwrap();
        assert_eq!(contents, "before\nafter\n");
    }
}
