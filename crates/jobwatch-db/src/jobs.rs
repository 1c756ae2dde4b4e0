//! Queries against the externally owned `jobs` and `job_search_terms` tables.

use jobwatch_core::JobRecord;
use sqlx::PgPool;

use crate::DbError;

/// Text written to `jobs.comment` when a posting is found to be expired.
pub const EXPIRED_COMMENT: &str = "This job is no longer advertised";

/// A pending-queue row from `jobs`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub job_number: i64,
    pub comment: Option<String>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            job_number: row.job_number,
            comment: row.comment,
        }
    }
}

/// Returns every job still awaiting an expiry decision, ascending by `job_number`.
///
/// A job qualifies when its `comment` is null and it is referenced by at least
/// one search term flagged `valid`. Read-only; safe to call repeatedly.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pending_jobs(pool: &PgPool) -> Result<Vec<JobRow>, DbError> {
    let rows = sqlx::query_as::<_, JobRow>(
        "SELECT j.job_number, j.comment \
         FROM jobs j \
         WHERE j.job_id IN ( \
             SELECT DISTINCT job_id \
             FROM job_search_terms \
             WHERE valid = TRUE \
         ) \
         AND j.comment IS NULL \
         ORDER BY j.job_number",
    )
    .fetch_all(pool)
    .await?;

    tracing::debug!(count = rows.len(), "loaded pending jobs");
    Ok(rows)
}

/// Sets `comment` to [`EXPIRED_COMMENT`] for `job_number`.
///
/// The statement runs outside any explicit transaction, so it is committed
/// by the time this returns `Ok`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no job has that number, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_job_expired(pool: &PgPool, job_number: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE jobs SET comment = $1 WHERE job_number = $2")
        .bind(EXPIRED_COMMENT)
        .bind(job_number)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound { job_number });
    }

    tracing::debug!(job_number, "job marked expired");
    Ok(())
}
