//! Retention sweep: delete dated log files older than the keep window.
use std::path::Path;

use chrono::NaiveDate;

use super::utils::file_name_date;

/// Return `true` if a file `age_days` old falls outside the retention window.
///
/// Files are kept while they are at most one day old regardless of
/// `keep_days`, so a sweep that runs right after rotation never touches
/// today's or yesterday's file.
pub(super) fn is_expired(age_days: i64, keep_days: u32) -> bool {
    age_days > 1 && age_days > i64::from(keep_days)
}

/// Delete every file in `dir` whose `YYYY-MM-DD` name prefix is expired
/// relative to `today` (a UTC calendar day).
///
/// Entries without a date prefix are ignored.  Listing and deletion failures
/// are logged at debug level and otherwise ignored.  Returns the number of
/// files deleted.
pub(super) async fn sweep(dir: &Path, keep_days: u32, today: NaiveDate) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "retention sweep skipped");
            return 0;
        }
    };

    let mut deleted = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "retention sweep stopped");
                break;
            }
        };
        let name = entry.file_name();
        let Some(date) = name.to_str().and_then(file_name_date) else {
            continue;
        };
        let age_days = (today - date).num_days();
        if !is_expired(age_days, keep_days) {
            continue;
        }
        let path = entry.path();
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(file = %path.display(), error = %e, "failed to delete expired log file");
            continue;
        }
        tracing::debug!(file = %path.display(), age_days, "deleted expired log file");
        deleted += 1;
    }
    deleted
}
