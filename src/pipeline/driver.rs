//! Session driver: authenticate, open the results view, then loop pages.

use super::navigator::{ItemNavigator, ProcessedIdentitySet};
use super::scroll::{load_all_items, ScrollSettings};
use crate::core::config::{Credentials, PageAdvance, ScoutConfig, Timings};
use crate::core::error::HarvestError;
use crate::core::selectors::SiteSelectors;
use crate::extraction::FieldExtractor;
use crate::scraping::session::{BrowserSession, ChromiumSession, Locator};
use crate::types::ListingRecord;
use tracing::{debug, error, info, warn};

/// Result of one harvesting session.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub run_id: String,
    /// Records in extraction order across all pages.
    pub records: Vec<ListingRecord>,
    pub pages_visited: usize,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

/// Owns the resolved configuration for harvesting runs.
///
/// Cheap to share behind an `Arc`; each [`Harvester::run`] launches its own
/// browser and tears it down before returning.
#[derive(Debug, Clone)]
pub struct Harvester {
    config: ScoutConfig,
    login_url: String,
    pagination: PageAdvance,
    timings: Timings,
    selectors: SiteSelectors,
    extractor: FieldExtractor,
}

impl Harvester {
    pub fn new(config: ScoutConfig) -> Self {
        let selectors = config.selectors.clone();
        Self {
            login_url: config.resolve_login_url(),
            pagination: config.resolve_pagination(),
            timings: config.resolve_timings(),
            extractor: FieldExtractor::new(selectors.detail.clone()),
            selectors,
            config,
        }
    }

    pub fn pagination(&self) -> PageAdvance {
        self.pagination
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Full session: launch, authenticate, harvest `page_count` pages, close.
    ///
    /// The browser is closed on every path once it has been launched.
    pub async fn run(
        &self,
        target_url: &str,
        page_count: usize,
    ) -> Result<HarvestReport, HarvestError> {
        let credentials = self
            .config
            .resolve_credentials()
            .ok_or(HarvestError::MissingCredentials)?;

        let mut session = ChromiumSession::launch(&self.config.resolve_browser()).await?;
        self.run_and_close(&mut session, &credentials, target_url, page_count)
            .await
    }

    /// [`Self::run_with_session`], then close the session whatever the outcome.
    pub async fn run_and_close(
        &self,
        session: &mut dyn BrowserSession,
        credentials: &Credentials,
        target_url: &str,
        page_count: usize,
    ) -> Result<HarvestReport, HarvestError> {
        let result = self
            .run_with_session(session, credentials, target_url, page_count)
            .await;
        session.close().await;

        if let Err(e) = &result {
            error!("❌ Harvest aborted: {}", e);
        }
        result
    }

    /// Drive an already-open session. Does not close it.
    pub async fn run_with_session(
        &self,
        session: &mut dyn BrowserSession,
        credentials: &Credentials,
        target_url: &str,
        page_count: usize,
    ) -> Result<HarvestReport, HarvestError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            "🧭 Harvest {} started: {} ({} page(s), {:?})",
            run_id, target_url, page_count, self.pagination
        );

        self.authenticate(session, credentials).await?;

        info!("🌐 Opening results view");
        session
            .navigate(target_url)
            .await
            .map_err(HarvestError::NavigationFailed)?;

        let scroll = ScrollSettings {
            list_container: self.selectors.listing.list_container.clone(),
            item: Locator::css(self.selectors.listing.item.as_str()),
            pause: self.timings.scroll_pause,
            max_attempts: self.timings.max_scroll_attempts,
        };
        let navigator = ItemNavigator::new(&self.selectors.listing, &self.timings, &self.extractor);

        let mut processed = ProcessedIdentitySet::default();
        let mut records = Vec::new();
        let mut pages_visited = 0;

        for page in 1..=page_count {
            if page > 1 && self.pagination == PageAdvance::NextPageControl {
                if !self.advance_page(session, page).await {
                    info!("⏹️ No page {} available; stopping pagination", page);
                    break;
                }
            }

            info!("📄 Processing page {}/{}", page, page_count);
            let outcome = load_all_items(session, &scroll).await;
            debug!("page {} scroll outcome: {:?}", page, outcome);

            let pass = navigator.process_listing(session, &mut processed).await;
            pages_visited += 1;
            records.extend(pass.into_records());
        }

        info!(
            "🏁 Harvest {} finished: {} record(s) from {} page(s)",
            run_id,
            records.len(),
            pages_visited
        );

        Ok(HarvestReport {
            run_id,
            records,
            pages_visited,
            finished_at: chrono::Utc::now(),
        })
    }

    async fn authenticate(
        &self,
        session: &mut dyn BrowserSession,
        credentials: &Credentials,
    ) -> Result<(), HarvestError> {
        info!("🔐 Logging in");
        session
            .navigate(&self.login_url)
            .await
            .map_err(HarvestError::NavigationFailed)?;
        tokio::time::sleep(self.timings.login_page_settle).await;

        let login = &self.selectors.login;
        session
            .type_text(&login.username, &credentials.username)
            .await
            .map_err(|e| HarvestError::AuthenticationFailed(format!("username field: {}", e)))?;
        session
            .type_text(&login.password, &credentials.password)
            .await
            .map_err(|e| HarvestError::AuthenticationFailed(format!("password field: {}", e)))?;
        session
            .click(&login.submit)
            .await
            .map_err(|e| HarvestError::AuthenticationFailed(format!("submit: {}", e)))?;

        tokio::time::sleep(self.timings.post_login_settle).await;
        info!("✅ Login submitted");
        Ok(())
    }

    /// Click the numbered control for `page` and wait for it to become active.
    /// Returns `false` when the control is missing or never activates.
    async fn advance_page(&self, session: &mut dyn BrowserSession, page: usize) -> bool {
        let pagination = &self.selectors.pagination;
        let button = pagination.page_button_for(page);
        if let Err(e) = session.click(&button).await {
            warn!("⚠️ Page control {} unavailable: {}", page, e);
            return false;
        }

        let active = pagination.active_page_for(page);
        match session.wait_for(&active, self.timings.pagination_timeout).await {
            Ok(outcome) if outcome.is_present() => true,
            Ok(outcome) => {
                warn!("⚠️ Page {} did not become active: {:?}", page, outcome);
                false
            }
            Err(e) => {
                warn!("⚠️ Waiting for page {} failed: {}", page, e);
                false
            }
        }
    }
}
