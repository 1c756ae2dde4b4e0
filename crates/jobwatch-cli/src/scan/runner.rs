//! The expiry scan loop: pending queue in, store updates and progress lines out.
//!
//! Jobs are processed strictly one after another in queue order. A job's log
//! line is written only after its store update returned, so the progress log
//! never runs ahead of committed state and a rerun after a crash picks up
//! exactly the jobs that are still pending.

use jobwatch_core::{job_detail_url, ExpiryEvent, FailurePolicy};
use jobwatch_db::DbError;
use jobwatch_scraper::{
    ExpiryDetector, FetchError, FetchedPage, HtmlTextExtractor, ListingState, RateLimitedFetcher,
    TextExtractor,
};
use tokio::io::AsyncWrite;

use super::progress_log::ProgressLog;

/// Source of the pending queue and sink for expiry decisions.
pub(crate) trait JobStore {
    /// Job numbers awaiting a decision, ascending.
    async fn pending_jobs(&self) -> Result<Vec<i64>, DbError>;

    /// Durably records that `job_number` is no longer advertised.
    async fn mark_expired(&self, job_number: i64) -> Result<(), DbError>;
}

/// Anything that can fetch a job page the way [`RateLimitedFetcher`] does.
pub(crate) trait PageSource {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError>;
}

impl PageSource for RateLimitedFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        RateLimitedFetcher::fetch(self, url).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    Idle,
    Running,
    Completed,
    AbortedOnFetchFailure,
}

/// Whether the loop carries on after a fetch exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Stop,
}

pub(crate) fn after_fetch_failure(policy: FailurePolicy) -> LoopControl {
    match policy {
        FailurePolicy::Abort => LoopControl::Stop,
        FailurePolicy::Skip => LoopControl::Continue,
    }
}

#[derive(Debug)]
pub(crate) struct FetchAbort {
    pub job_number: i64,
    pub error: FetchError,
}

#[derive(Debug)]
pub(crate) struct ScanReport {
    pub state: ScanState,
    pub queued: usize,
    pub evaluated: usize,
    pub advertised: usize,
    /// Jobs detected as expired, in queue order. In a dry run nothing was written.
    pub expired: Vec<i64>,
    pub indeterminate: Vec<i64>,
    /// Jobs whose fetch failed and were passed over under [`FailurePolicy::Skip`].
    pub skipped: Vec<i64>,
    pub abort: Option<FetchAbort>,
}

impl ScanReport {
    fn new(queued: usize) -> Self {
        Self {
            state: ScanState::Running,
            queued,
            evaluated: 0,
            advertised: 0,
            expired: Vec::new(),
            indeterminate: Vec::new(),
            skipped: Vec::new(),
            abort: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ScanError {
    #[error("job store error: {0}")]
    Store(#[from] DbError),
    #[error("failed to write progress log: {0}")]
    Log(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub(crate) struct ScanSettings {
    pub job_detail_base_url: String,
    pub on_fetch_failure: FailurePolicy,
    pub dry_run: bool,
}

pub(crate) struct ScanLoop<'a, S, P, X = HtmlTextExtractor> {
    store: &'a S,
    pages: &'a mut P,
    detector: ExpiryDetector<X>,
    settings: ScanSettings,
    state: ScanState,
}

impl<'a, S, P> ScanLoop<'a, S, P>
where
    S: JobStore,
    P: PageSource,
{
    pub(crate) fn new(store: &'a S, pages: &'a mut P, settings: ScanSettings) -> Self {
        Self::with_detector(store, pages, ExpiryDetector::new(), settings)
    }
}

impl<'a, S, P, X> ScanLoop<'a, S, P, X>
where
    S: JobStore,
    P: PageSource,
    X: TextExtractor,
{
    pub(crate) fn with_detector(
        store: &'a S,
        pages: &'a mut P,
        detector: ExpiryDetector<X>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            store,
            pages,
            detector,
            settings,
            state: ScanState::Idle,
        }
    }

    pub(crate) fn state(&self) -> ScanState {
        self.state
    }

    /// Evaluates every pending job once, in queue order.
    ///
    /// A fetch that exhausts its retries ends the run under
    /// [`FailurePolicy::Abort`] and is reported in [`ScanReport::abort`]; it
    /// is not an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Store`] if loading the queue or marking a job
    /// fails, and [`ScanError::Log`] if a progress line cannot be written.
    pub(crate) async fn run<W>(&mut self, log: &mut ProgressLog<W>) -> Result<ScanReport, ScanError>
    where
        W: AsyncWrite + Unpin,
    {
        self.state = ScanState::Running;
        let queue = self.store.pending_jobs().await?;
        let mut report = ScanReport::new(queue.len());
        tracing::info!(
            queued = queue.len(),
            dry_run = self.settings.dry_run,
            on_fetch_failure = %self.settings.on_fetch_failure,
            "starting expiry scan"
        );

        for job_number in queue {
            let url = job_detail_url(&self.settings.job_detail_base_url, job_number);

            let page = match self.pages.fetch(&url).await {
                Ok(page) => page,
                Err(error) => {
                    tracing::error!(job_number, %url, error = %error, "fetch failed after retries");
                    match after_fetch_failure(self.settings.on_fetch_failure) {
                        LoopControl::Continue => {
                            report.skipped.push(job_number);
                            continue;
                        }
                        LoopControl::Stop => {
                            self.state = ScanState::AbortedOnFetchFailure;
                            report.state = self.state;
                            report.abort = Some(FetchAbort { job_number, error });
                            return Ok(report);
                        }
                    }
                }
            };

            report.evaluated += 1;
            match self.detector.assess(&page) {
                ListingState::Advertised => {
                    tracing::debug!(job_number, "still advertised");
                    report.advertised += 1;
                }
                ListingState::Indeterminate => {
                    tracing::warn!(
                        job_number,
                        status = page.status,
                        "no usable page; leaving job pending"
                    );
                    report.indeterminate.push(job_number);
                }
                ListingState::Expired => {
                    if self.settings.dry_run {
                        tracing::info!(job_number, "dry-run: would mark job expired");
                    } else {
                        self.store.mark_expired(job_number).await?;
                        log.record(&ExpiryEvent::now(job_number)).await?;
                        tracing::info!(job_number, "job marked expired");
                    }
                    report.expired.push(job_number);
                }
            }
        }

        self.state = ScanState::Completed;
        report.state = self.state;
        tracing::info!(
            evaluated = report.evaluated,
            expired = report.expired.len(),
            indeterminate = report.indeterminate.len(),
            skipped = report.skipped.len(),
            "expiry scan completed"
        );
        Ok(report)
    }
}
