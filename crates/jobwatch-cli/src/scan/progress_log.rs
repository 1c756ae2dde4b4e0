//! Append-only record of jobs marked expired, one line per job.

use std::io;
use std::path::Path;

use jobwatch_core::ExpiryEvent;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub(crate) struct ProgressLog<W = File> {
    writer: W,
}

impl ProgressLog<File> {
    /// Opens `path` for appending, creating it if needed. Existing lines are kept.
    pub(crate) async fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self { writer: file })
    }
}

impl<W: AsyncWrite + Unpin> ProgressLog<W> {
    pub(crate) fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one `Job {n} marked as expired at {timestamp}` line and flushes
    /// it before returning.
    pub(crate) async fn record(&mut self, event: &ExpiryEvent) -> io::Result<()> {
        let line = format!("{event}\n");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;

    fn event(job_number: i64) -> ExpiryEvent {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        ExpiryEvent::new(job_number, at)
    }

    #[tokio::test]
    async fn record_writes_one_line_per_event() {
        let mut log = ProgressLog::from_writer(Vec::new());
        log.record(&event(101)).await.unwrap();
        log.record(&event(205)).await.unwrap();

        let text = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(
            text,
            "Job 101 marked as expired at 2024-05-01 09:30:00\n\
             Job 205 marked as expired at 2024-05-01 09:30:00\n"
        );
    }

    #[tokio::test]
    async fn open_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed_jobs_log.txt");
        std::fs::write(&path, "Job 1 marked as expired at 2024-01-01 00:00:00\n").unwrap();

        let mut log = ProgressLog::open(&path).await.unwrap();
        log.record(&event(2)).await.unwrap();
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Job 1 "));
        assert_eq!(lines[1], "Job 2 marked as expired at 2024-05-01 09:30:00");
    }

    #[tokio::test]
    async fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");

        let mut log = ProgressLog::open(&path).await.unwrap();
        log.record(&event(9)).await.unwrap();

        // Flushed on record, so visible without dropping the handle.
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Job 9 marked as expired at 2024-05-01 09:30:00\n");
    }
}
