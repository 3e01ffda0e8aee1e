// Shared helpers for integration tests.
//
// Provides a hand-driven clock and a temporary log directory so each
// integration test can run a logger session in isolation and inspect the
// files it leaves behind.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use daylog::config::LoggerOptions;
use daylog::logging::{Clock, Logger};

/// A [`Clock`] that only moves when [`TestClock::set`] is called.
#[derive(Debug)]
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    /// Create a clock frozen at an RFC 3339 instant.
    pub fn at(rfc3339: &str) -> Arc<Self> {
        Arc::new(Self(Mutex::new(parse(rfc3339))))
    }

    /// Move the clock to an RFC 3339 instant.
    pub fn set(&self, rfc3339: &str) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = parse(rfc3339);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 instant")
        .to_utc()
}

/// An isolated logger session backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct LogDirContext {
    /// Temporary log directory.
    pub dir: tempfile::TempDir,
    /// Clock driving the logger.
    pub clock: Arc<TestClock>,
    /// The logger under test; inactive until opened.
    pub log: Logger,
}

impl LogDirContext {
    /// Create a context whose clock starts at `rfc3339`.
    pub fn at(rfc3339: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let clock = TestClock::at(rfc3339);
        let log = Logger::with_clock(clock.clone());
        Self { dir, clock, log }
    }

    /// Path to the log directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the log directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Options pointing at the log directory with UTC timestamps and a
    /// flush period long enough that only explicit flushes write.
    pub fn options(&self) -> LoggerOptions {
        LoggerOptions::default()
            .dir(self.path())
            .use_local_time(false)
            .write_interval("1h")
    }

    /// Read a log file to a string.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.file(name)).expect("read log file")
    }

    /// Create a file with placeholder content.
    pub fn touch(&self, name: &str) {
        std::fs::write(self.file(name), "x\n").expect("write file");
    }

    /// Sorted names of every file in the log directory.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path())
            .expect("read log dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// One `<name>: <lines>` row per file, sorted by name.
    pub fn layout(&self) -> String {
        self.file_names()
            .iter()
            .map(|name| format!("{name}: {}", self.read(name).lines().count()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
