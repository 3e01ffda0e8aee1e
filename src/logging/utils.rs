//! Utility functions for log file naming and time formatting.
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Length of the `YYYY-MM-DD` prefix that starts every log file name.
pub(super) const DATE_PREFIX_LEN: usize = 10;

/// Return `<dir>/<YYYY-MM-DD>-<channel>.log` for the UTC day of `now`.
pub(super) fn log_file_path(dir: &Path, channel: &str, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("{}-{channel}.log", format_utc_date(now)))
}

/// Format the UTC calendar day of `now` as `YYYY-MM-DD`.
pub(super) fn format_utc_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Format a record timestamp as `YYYY-MM-DD HH:MM:SS.sss`, in local time or UTC.
pub(super) fn format_timestamp(now: DateTime<Utc>, local: bool) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
    if local {
        now.with_timezone(&Local).format(FORMAT).to_string()
    } else {
        now.format(FORMAT).to_string()
    }
}

/// Extract the date encoded in the first ten characters of a log file name.
///
/// Returns `None` for names that are too short or do not start with a
/// valid `YYYY-MM-DD` date.
pub(super) fn file_name_date(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..DATE_PREFIX_LEN)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Lock a mutex, recovering the data if another thread panicked while holding it.
pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-lock an `RwLock`, recovering from poisoning.
pub(super) fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock an `RwLock`, recovering from poisoning.
pub(super) fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn log_file_path_uses_utc_date_and_channel() {
        let path = log_file_path(Path::new("/tmp/log"), "warning", at(2024, 3, 9, 23, 59, 59));
        assert_eq!(path, PathBuf::from("/tmp/log/2024-03-09-warning.log"));
    }

    #[test]
    fn utc_timestamp_has_millisecond_precision() {
        let ts = format_timestamp(at(2024, 3, 9, 8, 5, 1), false);
        assert_eq!(ts, "2024-03-09 08:05:01.000");
    }

    #[test]
    fn local_timestamp_has_same_shape() {
        let ts = format_timestamp(at(2024, 3, 9, 8, 5, 1), true);
        assert_eq!(ts.len(), 23, "YYYY-MM-DD HH:MM:SS.sss should be 23 chars");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn file_name_date_reads_prefix() {
        assert_eq!(
            file_name_date("2024-03-09-error.log"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
    }

    #[test]
    fn file_name_date_rejects_undated_names() {
        assert_eq!(file_name_date("notes.txt"), None);
        assert_eq!(file_name_date("short"), None);
        assert_eq!(file_name_date("2024-13-40-error.log"), None);
    }
}
