//! Expiry detection from a fetched job page.
//!
//! The page's visible text is flattened to lower-case words joined by single
//! spaces and searched for [`EXPIRY_MARKER`]. Text extraction sits behind
//! [`TextExtractor`] so detection can be exercised without parsing HTML.

use scraper::Html;

use crate::fetcher::FetchedPage;

/// Phrase the job board shows on postings that have been taken down, already
/// lower-cased and whitespace-normalized.
pub const EXPIRY_MARKER: &str = "this job is no longer advertised";

/// Elements whose text content never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// What a fetched page says about its posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    /// The page loaded and carries no expiry marker.
    Advertised,
    /// The page loaded and shows the expiry marker.
    Expired,
    /// The page did not load with a 200, so there is no evidence either way.
    Indeterminate,
}

impl ListingState {
    /// `Some(true)` for advertised, `Some(false)` for expired, `None` when
    /// indeterminate.
    #[must_use]
    pub fn still_advertised(self) -> Option<bool> {
        match self {
            ListingState::Advertised => Some(true),
            ListingState::Expired => Some(false),
            ListingState::Indeterminate => None,
        }
    }
}

/// Turns a document into the text a reader would see.
pub trait TextExtractor {
    fn visible_text(&self, html: &str) -> String;
}

/// [`TextExtractor`] backed by the `scraper` HTML parser.
///
/// Collects every text node with no script-like element anywhere above it,
/// splits on whitespace and joins the pieces with single spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTextExtractor;

impl TextExtractor for HtmlTextExtractor {
    fn visible_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut words: Vec<&str> = Vec::new();

        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .ancestors()
                .filter_map(|ancestor| ancestor.value().as_element())
                .any(|element| HIDDEN_ELEMENTS.contains(&element.name()));
            if hidden {
                continue;
            }
            words.extend(text.split_whitespace());
        }

        words.join(" ")
    }
}

#[derive(Debug, Default, Clone)]
pub struct ExpiryDetector<X = HtmlTextExtractor> {
    extractor: X,
}

impl ExpiryDetector<HtmlTextExtractor> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<X: TextExtractor> ExpiryDetector<X> {
    pub fn with_extractor(extractor: X) -> Self {
        Self { extractor }
    }

    /// Classifies `page`. Anything other than a 200 is
    /// [`ListingState::Indeterminate`] without looking at the body.
    pub fn assess(&self, page: &FetchedPage) -> ListingState {
        if !page.is_ok() {
            return ListingState::Indeterminate;
        }
        if self.shows_marker(&page.body) {
            ListingState::Expired
        } else {
            ListingState::Advertised
        }
    }

    fn shows_marker(&self, html: &str) -> bool {
        let text = self.extractor.visible_text(html);
        // Re-normalize: extractors are only required to return readable text.
        let normalized = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        normalized.contains(EXPIRY_MARKER)
    }
}
