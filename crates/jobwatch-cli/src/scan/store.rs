//! [`JobStore`] over the Postgres `jobs` tables.

use jobwatch_db::DbError;
use sqlx::PgPool;

use super::runner::JobStore;

pub(crate) struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl JobStore for PgJobStore {
    async fn pending_jobs(&self) -> Result<Vec<i64>, DbError> {
        let rows = jobwatch_db::list_pending_jobs(&self.pool).await?;
        Ok(rows.into_iter().map(|row| row.job_number).collect())
    }

    async fn mark_expired(&self, job_number: i64) -> Result<(), DbError> {
        jobwatch_db::mark_job_expired(&self.pool, job_number).await
    }
}
