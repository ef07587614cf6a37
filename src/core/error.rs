use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`crate::scraping::session::BrowserSession`].
///
/// These are all *transient* from the pipeline's point of view: the element
/// may simply not be rendered yet, or may have been replaced by a re-render.
/// Callers recover at the smallest scope (one item, one scroll attempt).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no element matches {0}")]
    ElementNotFound(String),

    #[error("element {locator} is not interactable: {reason}")]
    NotInteractable { locator: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// Why a single listing item was skipped.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("detail view marker {marker} did not appear within {waited:?}")]
    Timeout { marker: String, waited: Duration },
}

/// Session-level failures. Only these escape [`crate::pipeline::Harvester::run`].
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("no Chromium-family browser found; install Chrome/Chromium or set CHROME_EXECUTABLE")]
    BrowserNotFound,

    #[error("browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("credentials missing; set LISTING_SCOUT_USERNAME and LISTING_SCOUT_PASSWORD")]
    MissingCredentials,

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(#[source] SessionError),
}

impl HarvestError {
    /// `true` for errors caused by the caller's setup rather than the remote page.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HarvestError::BrowserNotFound | HarvestError::MissingCredentials
        )
    }
}
