use std::str::FromStr;
use std::time::Duration;

use jobwatch_core::{AppConfig, AuthMethod, DatabaseTarget};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 2;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/jobwatch-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

pub mod jobs;

pub use jobs::{list_pending_jobs, mark_job_expired, JobRow, EXPIRED_COMMENT};

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("job {job_number} not found")]
    NotFound { job_number: i64 },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Translate a [`DatabaseTarget`] into Postgres connect options.
///
/// A URL is parsed as-is. For host/port/name targets, trusted auth sends no
/// password (the server decides via peer, trust or GSSAPI rules) and password
/// auth sends the configured user and password.
///
/// # Errors
///
/// Returns [`sqlx::Error::Configuration`] if the URL does not parse.
pub fn connect_options(target: &DatabaseTarget) -> Result<PgConnectOptions, sqlx::Error> {
    match target {
        DatabaseTarget::Url(url) => PgConnectOptions::from_str(url),
        DatabaseTarget::Parts {
            host,
            port,
            name,
            auth,
        } => {
            let options = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(name);
            let options = match auth {
                AuthMethod::Trusted { user: Some(user) } => options.username(user),
                AuthMethod::Trusted { user: None } => options,
                AuthMethod::Password { user, password } => {
                    options.username(user).password(password)
                }
            };
            Ok(options)
        }
    }
}

/// Connect to a Postgres pool using an explicit target and pool config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the target is malformed or the connection cannot
/// be established.
pub async fn connect_pool(
    target: &DatabaseTarget,
    config: PoolConfig,
) -> Result<PgPool, sqlx::Error> {
    let options = connect_options(target)?;
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table may not exist yet on a fresh database; treat
    // absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn connect_options_from_parts_with_password() {
        let target = DatabaseTarget::Parts {
            host: "db.internal".to_string(),
            port: 6543,
            name: "jobs".to_string(),
            auth: AuthMethod::Password {
                user: "scanner".to_string(),
                password: "hunter2".to_string(),
            },
        };
        let options = connect_options(&target).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("jobs"));
        assert_eq!(options.get_username(), "scanner");
    }

    #[test]
    fn connect_options_from_parts_trusted_with_user() {
        let target = DatabaseTarget::Parts {
            host: "localhost".to_string(),
            port: 5432,
            name: "jobs".to_string(),
            auth: AuthMethod::Trusted {
                user: Some("svc_jobwatch".to_string()),
            },
        };
        let options = connect_options(&target).unwrap();
        assert_eq!(options.get_username(), "svc_jobwatch");
        assert_eq!(options.get_database(), Some("jobs"));
    }

    #[test]
    fn connect_options_from_url() {
        let target = DatabaseTarget::Url("postgres://u:p@example.com:5433/jobs".to_string());
        let options = connect_options(&target).unwrap();
        assert_eq!(options.get_host(), "example.com");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("jobs"));
        assert_eq!(options.get_username(), "u");
    }

    #[test]
    fn connect_options_rejects_garbage_url() {
        let target = DatabaseTarget::Url("not a url".to_string());
        assert!(connect_options(&target).is_err());
    }
}
