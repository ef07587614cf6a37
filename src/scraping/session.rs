//! Browser capability set used by the pipeline.
//!
//! The pipeline only talks to [`BrowserSession`]; [`ChromiumSession`] is the
//! production implementation on top of `chromiumoxide`. Element handles never
//! leave this module: every call re-resolves its [`Locator`] against the live
//! page, so a re-render between two calls cannot leave the caller holding a
//! detached node.

use crate::core::config::BrowserSettings;
use crate::core::error::{HarvestError, SessionError};
use crate::scraping::browser_manager;
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Poll period used by [`BrowserSession::wait_for`].
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How to find an element on the live page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    Id(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{}`", s),
            Locator::Id(s) => write!(f, "id `{}`", s),
            Locator::XPath(s) => write!(f, "xpath `{}`", s),
        }
    }
}

/// Result of a bounded wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    Present { waited: Duration },
    TimedOut { waited: Duration },
}

impl WaitOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, WaitOutcome::Present { .. })
    }
}

/// One interactive browser viewport, driven strictly sequentially.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// URL of the current document, used to resolve relative links.
    async fn current_url(&mut self) -> Result<Option<String>, SessionError>;

    /// Number of elements matching `locator` right now.
    async fn count(&mut self, locator: &Locator) -> Result<usize, SessionError>;

    /// Click the first element matching `locator`.
    async fn click(&mut self, locator: &Locator) -> Result<(), SessionError>;

    /// Focus the first element matching `locator` and type `text` into it.
    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), SessionError>;

    /// Scroll a scrollable element to its maximum extent.
    async fn scroll_to_end(&mut self, locator: &Locator) -> Result<(), SessionError>;

    /// Scroll the `index`-th match of `locator` into view, then click it.
    async fn activate_nth(&mut self, locator: &Locator, index: usize) -> Result<(), SessionError>;

    async fn execute(&mut self, script: &str) -> Result<serde_json::Value, SessionError>;

    /// Full serialised markup of the current document.
    async fn content(&mut self) -> Result<String, SessionError>;

    /// Release the underlying browser. Idempotent.
    async fn close(&mut self);

    /// Wait until `locator` matches at least one element, or `timeout` elapses.
    ///
    /// Lookup errors during the wait count as "not yet present".
    async fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WaitOutcome, SessionError> {
        let start = Instant::now();
        loop {
            match self.count(locator).await {
                Ok(n) if n > 0 => {
                    return Ok(WaitOutcome::Present {
                        waited: start.elapsed(),
                    })
                }
                Ok(_) => {}
                Err(e) => debug!("wait_for {}: lookup error while polling: {}", locator, e),
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Ok(WaitOutcome::TimedOut { waited });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout - waited)).await;
        }
    }

    /// Scroll the whole document to the bottom.
    async fn scroll_document_to_end(&mut self) -> Result<(), SessionError> {
        self.execute("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map(|_| ())
    }
}

// ── chromiumoxide implementation ─────────────────────────────────────────────

/// A launched headless browser plus the single tab the pipeline drives.
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch a browser and open one blank tab.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, HarvestError> {
        let exe = browser_manager::resolve_executable(settings.executable.as_deref())
            .ok_or(HarvestError::BrowserNotFound)?;

        info!(
            "🚀 Launching browser ({}) {}x{} headless={}",
            exe, settings.width, settings.height, settings.headless
        );

        let config = browser_manager::build_headless_config(
            &exe,
            settings.width,
            settings.height,
            settings.headless,
        )
        .map_err(|e| HarvestError::BrowserLaunchFailed(e.to_string()))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::BrowserLaunchFailed(format!("{} ({})", e, exe)))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                browser.close().await.ok();
                handle.abort();
                return Err(HarvestError::BrowserLaunchFailed(format!(
                    "failed to open tab: {}",
                    e
                )));
            }
        };

        Ok(Self {
            browser: Some(browser),
            page,
            handler: handle,
        })
    }

    async fn elements(&self, locator: &Locator) -> Result<Vec<Element>, SessionError> {
        let found = match locator {
            Locator::Css(selector) => self.page.find_elements(selector.as_str()).await,
            Locator::Id(id) => self.page.find_elements(format!("[id=\"{}\"]", id)).await,
            Locator::XPath(expr) => self.page.find_xpaths(expr.as_str()).await,
        };
        // CDP reports "no node found" as an error for some lookups; treat it as zero matches.
        match found {
            Ok(elements) => Ok(elements),
            Err(e) => {
                debug!("lookup {} returned error, treating as empty: {}", locator, e);
                Ok(Vec::new())
            }
        }
    }

    async fn nth(&self, locator: &Locator, index: usize) -> Result<Element, SessionError> {
        let mut elements = self.elements(locator).await?;
        if index >= elements.len() {
            return Err(SessionError::ElementNotFound(format!(
                "{} [#{} of {}]",
                locator,
                index,
                elements.len()
            )));
        }
        Ok(elements.swap_remove(index))
    }
}

fn not_interactable(locator: &Locator, e: impl fmt::Display) -> SessionError {
    SessionError::NotInteractable {
        locator: locator.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        info!("🌐 Navigating to: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<Option<String>, SessionError> {
        self.page
            .url()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, SessionError> {
        Ok(self.elements(locator).await?.len())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), SessionError> {
        let element = self.nth(locator, 0).await?;
        element
            .click()
            .await
            .map_err(|e| not_interactable(locator, e))?;
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        let element = self.nth(locator, 0).await?;
        element
            .click()
            .await
            .map_err(|e| not_interactable(locator, e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| not_interactable(locator, e))?;
        Ok(())
    }

    async fn scroll_to_end(&mut self, locator: &Locator) -> Result<(), SessionError> {
        let element = self.nth(locator, 0).await?;
        element
            .call_js_fn(
                "function() { this.scrollTo(0, this.scrollHeight); }",
                false,
            )
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(())
    }

    async fn activate_nth(&mut self, locator: &Locator, index: usize) -> Result<(), SessionError> {
        let element = self.nth(locator, index).await?;
        element
            .scroll_into_view()
            .await
            .map_err(|e| not_interactable(locator, e))?;
        element
            .click()
            .await
            .map_err(|e| not_interactable(locator, e))?;
        Ok(())
    }

    async fn execute(&mut self, script: &str) -> Result<serde_json::Value, SessionError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Protocol(format!("failed to read page content: {}", e)))
    }

    async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close error (non-fatal): {}", e);
            }
            info!("🛑 Browser session closed");
        }
        self.handler.abort();
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Drop cannot await; if the run bailed out before `close()`, hand the
        // browser to the runtime so no Chromium process outlives the session.
        if let Some(mut browser) = self.browser.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = browser.close().await;
                });
            }
        }
        self.handler.abort();
    }
}
