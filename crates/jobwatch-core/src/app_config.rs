use std::path::PathBuf;
use std::time::Duration;

/// Pacing and retry numbers for outbound page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Minimum spacing between any two outbound requests.
    pub min_interval: Duration,
    /// Timeout applied to each individual attempt.
    pub request_timeout: Duration,
    /// Total attempts per fetch, first try included. Always at least 1.
    pub max_attempts: u32,
    /// Fixed wait between a failed attempt and the next one.
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_attempts: 4,
            retry_delay: Duration::from_secs(30),
        }
    }
}

/// What the scan does with a job whose fetch exhausted every retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run; the failed job and everything after it stay pending.
    #[default]
    Abort,
    /// Log the failure, leave the job pending and move on to the next one.
    Skip,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No password is sent; the server trusts the OS user or a peer/GSSAPI rule.
    Trusted { user: Option<String> },
    Password { user: String, password: String },
}

/// Where the job store lives.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        name: String,
        auth: AuthMethod,
    },
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Trusted { user } => f.debug_struct("Trusted").field("user", user).finish(),
            AuthMethod::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .field("password", &"[redacted]")
                .finish(),
        }
    }
}

impl std::fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseTarget::Url(_) => f.debug_tuple("Url").field(&"[redacted]").finish(),
            DatabaseTarget::Parts {
                host,
                port,
                name,
                auth,
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("name", name)
                .field("auth", auth)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseTarget,
    pub job_detail_base_url: String,
    pub log_level: String,
    pub progress_log_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch: FetchPolicy,
    pub user_agent: String,
    pub on_fetch_failure: FailurePolicy,
}
