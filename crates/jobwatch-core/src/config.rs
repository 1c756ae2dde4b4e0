use std::time::Duration;

use crate::app_config::{AppConfig, AuthMethod, DatabaseTarget, FailurePolicy, FetchPolicy};
use crate::ConfigError;

/// Upper bound for the fetch timing settings.
const MAX_FETCH_SECS: u64 = 24 * 60 * 60;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        or_default(var, default)
            .parse::<u16>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_fetch_secs = |var: &str, default: &str| -> Result<Duration, ConfigError> {
        let secs = parse_u64(var, default)?;
        if secs > MAX_FETCH_SECS {
            return Err(invalid(var, format!("must be at most {MAX_FETCH_SECS} seconds")));
        }
        Ok(Duration::from_secs(secs))
    };

    let job_detail_base_url = require("JOBWATCH_JOB_URL")?;

    let database = match lookup("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => DatabaseTarget::Url(url),
        _ => {
            let name = require("JOBWATCH_DB_NAME")?;
            let host = or_default("JOBWATCH_DB_HOST", "localhost");
            let port = parse_u16("JOBWATCH_DB_PORT", "5432")?;
            let auth = match or_default("JOBWATCH_DB_AUTH", "trusted").as_str() {
                "trusted" => AuthMethod::Trusted {
                    user: require("JOBWATCH_DB_USER").ok(),
                },
                "password" => AuthMethod::Password {
                    user: require("JOBWATCH_DB_USER")?,
                    password: require("JOBWATCH_DB_PASSWORD")?,
                },
                other => {
                    return Err(invalid(
                        "JOBWATCH_DB_AUTH",
                        format!("expected 'trusted' or 'password', got '{other}'"),
                    ))
                }
            };
            DatabaseTarget::Parts {
                host,
                port,
                name,
                auth,
            }
        }
    };

    let log_level = or_default("JOBWATCH_LOG_LEVEL", "info");
    let progress_log_path =
        PathBuf::from(or_default("JOBWATCH_PROGRESS_LOG", "completed_jobs_log.txt"));

    let db_max_connections = parse_u32("JOBWATCH_DB_MAX_CONNECTIONS", "2")?;
    let db_min_connections = parse_u32("JOBWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("JOBWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let max_attempts = parse_u32("JOBWATCH_MAX_ATTEMPTS", "4")?;
    if max_attempts == 0 {
        return Err(invalid("JOBWATCH_MAX_ATTEMPTS", "must be at least 1".to_string()));
    }
    let fetch = FetchPolicy {
        min_interval: parse_fetch_secs("JOBWATCH_MIN_INTERVAL_SECS", "5")?,
        request_timeout: parse_fetch_secs("JOBWATCH_REQUEST_TIMEOUT_SECS", "10")?,
        max_attempts,
        retry_delay: parse_fetch_secs("JOBWATCH_RETRY_DELAY_SECS", "30")?,
    };

    let user_agent = or_default("JOBWATCH_USER_AGENT", "jobwatch/0.1 (expiry-check)");
    let on_fetch_failure =
        parse_failure_policy(&or_default("JOBWATCH_ON_FETCH_FAILURE", "abort"))?;

    Ok(AppConfig {
        database,
        job_detail_base_url,
        log_level,
        progress_log_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch,
        user_agent,
        on_fetch_failure,
    })
}

/// Parse a string into a `FailurePolicy` variant.
fn parse_failure_policy(s: &str) -> Result<FailurePolicy, ConfigError> {
    match s {
        "abort" => Ok(FailurePolicy::Abort),
        "skip" => Ok(FailurePolicy::Skip),
        other => Err(ConfigError::InvalidEnvVar {
            var: "JOBWATCH_ON_FETCH_FAILURE".to_string(),
            reason: format!("expected 'abort' or 'skip', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
