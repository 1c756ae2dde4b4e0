//! Offline unit tests for jobwatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use jobwatch_core::{AppConfig, DatabaseTarget, FailurePolicy, FetchPolicy, JobRecord};
use jobwatch_db::{JobRow, PoolConfig};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database: DatabaseTarget::Url("postgres://example".to_string()),
        job_detail_base_url: "https://jobs.example.com/job/".to_string(),
        log_level: "info".to_string(),
        progress_log_path: PathBuf::from("completed_jobs_log.txt"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        fetch: FetchPolicy::default(),
        user_agent: "ua".to_string(),
        on_fetch_failure: FailurePolicy::Abort,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn job_row_converts_into_record() {
    let row = JobRow {
        job_number: 101,
        comment: None,
    };

    let record = JobRecord::from(row);
    assert_eq!(record.job_number, 101);
    assert!(record.is_pending());
}
