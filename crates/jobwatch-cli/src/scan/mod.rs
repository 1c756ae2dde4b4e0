//! `scan` and `pending` command handlers.
//!
//! Called from `main` once the pool and config exist. The pool is owned by
//! `main`, which closes it whatever these handlers return.

mod progress_log;
mod runner;
mod store;

use std::path::Path;

use anyhow::Context;
use jobwatch_core::{AppConfig, JobRecord};
use jobwatch_scraper::RateLimitedFetcher;

use self::progress_log::ProgressLog;
use self::runner::{ScanLoop, ScanReport, ScanSettings, ScanState};
use self::store::PgJobStore;

/// Runs one expiry scan over the pending queue.
///
/// With `dry_run` the pages are fetched and assessed but neither the store
/// nor the progress log is touched.
///
/// # Errors
///
/// Returns an error if the fetcher or progress log cannot be set up, if a
/// store operation fails, or if the run aborted on a fetch failure.
pub(crate) async fn run_scan(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dry_run: bool,
    log_file: Option<&Path>,
) -> anyhow::Result<()> {
    let store = PgJobStore::new(pool.clone());
    let mut fetcher = RateLimitedFetcher::new(&config.fetch, &config.user_agent)
        .context("failed to build HTTP client")?;
    let settings = ScanSettings {
        job_detail_base_url: config.job_detail_base_url.clone(),
        on_fetch_failure: config.on_fetch_failure,
        dry_run,
    };

    let report = if dry_run {
        let mut log = ProgressLog::from_writer(tokio::io::sink());
        ScanLoop::new(&store, &mut fetcher, settings)
            .run(&mut log)
            .await?
    } else {
        let path = log_file.unwrap_or(config.progress_log_path.as_path());
        let mut log = ProgressLog::open(path)
            .await
            .with_context(|| format!("failed to open progress log {}", path.display()))?;
        ScanLoop::new(&store, &mut fetcher, settings)
            .run(&mut log)
            .await?
    };

    print_report(&report, dry_run);

    if let Some(abort) = report.abort {
        return Err(anyhow::Error::new(abort.error)
            .context(format!("scan aborted at job {}", abort.job_number)));
    }
    Ok(())
}

fn print_report(report: &ScanReport, dry_run: bool) {
    let verb = if dry_run { "would mark" } else { "marked" };
    println!(
        "queued {}, evaluated {}, advertised {}, {verb} expired {}, \
         indeterminate {}, skipped {}",
        report.queued,
        report.evaluated,
        report.advertised,
        report.expired.len(),
        report.indeterminate.len(),
        report.skipped.len(),
    );
    if report.state == ScanState::AbortedOnFetchFailure {
        if let Some(abort) = &report.abort {
            println!(
                "aborted at job {}; it and the rest of the queue stay pending",
                abort.job_number
            );
        }
    }
}

/// Prints the current pending queue, one job number per line or as JSON.
///
/// # Errors
///
/// Returns an error if the query fails or the rows cannot be serialized.
pub(crate) async fn run_pending(pool: &sqlx::PgPool, json: bool) -> anyhow::Result<()> {
    let rows = jobwatch_db::list_pending_jobs(pool).await?;
    if json {
        let records: Vec<JobRecord> = rows.into_iter().map(JobRecord::from).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for row in &rows {
            println!("{}", row.job_number);
        }
        tracing::info!(count = rows.len(), "pending jobs listed");
    }
    Ok(())
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod tests;
