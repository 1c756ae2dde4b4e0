mod app_config;
mod config;
mod jobs;

pub use app_config::{AppConfig, AuthMethod, DatabaseTarget, FailurePolicy, FetchPolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use jobs::{job_detail_url, ExpiryEvent, JobRecord, LOG_TIMESTAMP_FORMAT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
