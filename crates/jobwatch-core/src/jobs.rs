//! Job identifiers and the records the expiry scan reads and produces.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Timestamp layout used in progress log lines, e.g. `2024-03-09 14:05:31`.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A row of the externally owned `jobs` table, as far as the scan cares.
///
/// `comment == None` means the job has never been evaluated. Any non-null
/// comment (including the expiry text) removes it from the pending queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub job_number: i64,
    pub comment: Option<String>,
}

impl JobRecord {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.comment.is_none()
    }
}

/// One durable progress entry: `job_number` was marked expired at `at`.
///
/// Only ever produced after the store update for `job_number` committed.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryEvent {
    pub job_number: i64,
    pub at: DateTime<Local>,
}

impl ExpiryEvent {
    #[must_use]
    pub fn new(job_number: i64, at: DateTime<Local>) -> Self {
        Self { job_number, at }
    }

    #[must_use]
    pub fn now(job_number: i64) -> Self {
        Self::new(job_number, Local::now())
    }
}

impl fmt::Display for ExpiryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job {} marked as expired at {}",
            self.job_number,
            self.at.format(LOG_TIMESTAMP_FORMAT)
        )
    }
}

/// Builds the job detail URL by plain concatenation of `base` and the job number.
///
/// No separator is inserted: `base` is expected to end where the number goes
/// (for example `https://jobs.example.com/job/`).
#[must_use]
pub fn job_detail_url(base: &str, job_number: i64) -> String {
    format!("{base}{job_number}")
}
