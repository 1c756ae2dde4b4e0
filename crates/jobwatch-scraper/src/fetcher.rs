//! Paced, retrying HTTP GET client for job detail pages.

use jobwatch_core::FetchPolicy;
use reqwest::Client;

use crate::error::FetchError;
use crate::rate_limit::{retry_fixed_delay, Pacer};

/// A page body together with the status it was served with.
///
/// Non-2xx responses are still pages: the caller decides what a 404 or 503
/// means, the fetcher never retries on status alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP client that spaces every request by the policy's minimum interval and
/// retries network failures with a fixed delay.
///
/// Holds the instant of the last request, so one fetcher should serve a whole
/// run. Requests are issued one at a time through `&mut self`.
pub struct RateLimitedFetcher {
    client: Client,
    policy: FetchPolicy,
    pacer: Pacer,
}

impl RateLimitedFetcher {
    /// Creates a fetcher with the policy's per-attempt timeout and the given
    /// `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(policy: &FetchPolicy, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(policy.request_timeout)
            .connect_timeout(policy.request_timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            policy: *policy,
            pacer: Pacer::new(policy.min_interval),
        })
    }

    #[must_use]
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// GETs `url`, pacing and retrying according to the policy.
    ///
    /// Any response that arrives, whatever its status, is returned as a
    /// [`FetchedPage`]. Timeouts, connection failures and body read errors are
    /// retried up to `max_attempts` in total.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RetriesExhausted`] with the last network error
    /// once every attempt has failed.
    pub async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let client = &self.client;
        retry_fixed_delay(
            &mut self.pacer,
            self.policy.max_attempts,
            self.policy.retry_delay,
            |attempt| async move {
                tracing::debug!(url, attempt, "fetching job page");
                get_page(client, url).await
            },
        )
        .await
        .map_err(|exhausted| FetchError::RetriesExhausted {
            url: url.to_owned(),
            attempts: exhausted.attempts,
            source: exhausted.last,
        })
    }
}

async fn get_page(client: &Client, url: &str) -> Result<FetchedPage, reqwest::Error> {
    let response = client
        .get(url)
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
        )
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(FetchedPage {
        url: url.to_owned(),
        status,
        body,
    })
}
