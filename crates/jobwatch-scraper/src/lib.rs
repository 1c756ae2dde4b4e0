pub mod detect;
pub mod error;
pub mod fetcher;
mod rate_limit;

pub use detect::{ExpiryDetector, HtmlTextExtractor, ListingState, TextExtractor, EXPIRY_MARKER};
pub use error::FetchError;
pub use fetcher::{FetchedPage, RateLimitedFetcher};
