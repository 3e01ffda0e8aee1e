//! Buffered multi-channel file logging with daily rotation and retention.

mod channel;
mod clock;
mod format;
mod logger;
mod retention;
mod subscriber;
mod task;
mod utils;

pub use clock::{Clock, SystemClock, next_midnight_delay, utc_day};
pub use format::Payload;
pub use logger::Logger;
pub use subscriber::{ChannelLayer, DEFAULT_INFO_CHANNEL, init_subscriber};

/// A clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock(std::sync::Mutex<chrono::DateTime<chrono::Utc>>);

#[cfg(test)]
#[allow(clippy::expect_used)]
impl ManualClock {
    /// Create a clock frozen at an RFC 3339 instant.
    pub(crate) fn at(rfc3339: &str) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self(std::sync::Mutex::new(parse_instant(rfc3339))))
    }

    /// Move the clock to an RFC 3339 instant.
    pub(crate) fn set(&self, rfc3339: &str) {
        *utils::lock(&self.0) = parse_instant(rfc3339);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        *utils::lock(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
fn parse_instant(rfc3339: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 instant")
        .to_utc()
}

/// Create an inactive logger driven by a [`ManualClock`] together with a
/// temporary directory to open it in.
///
/// The directory is deleted when the returned [`tempfile::TempDir`] drops,
/// so keep it alive for the duration of the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger(
    rfc3339: &str,
) -> (Logger, tempfile::TempDir, std::sync::Arc<ManualClock>) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let clock = ManualClock::at(rfc3339);
    let log = Logger::with_clock(clock.clone());
    (log, tmp, clock)
}
