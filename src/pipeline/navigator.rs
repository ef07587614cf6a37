//! Per-item navigation: identity, dedup, open detail view, wait, extract.
//!
//! The listing is captured once as markup and enumerated from that snapshot.
//! Cards are then re-located on the live page by `(selector, index)` at the
//! moment they are clicked; no element handle outlives a single call.

use crate::core::config::Timings;
use crate::core::error::ItemError;
use crate::core::selectors::ListingSelectors;
use crate::extraction::dom::{query_within, MarkupSnapshot};
use crate::extraction::FieldExtractor;
use crate::scraping::session::{BrowserSession, Locator, WaitOutcome};
use crate::types::ListingRecord;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

/// Deduplication key for one listing item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemIdentity {
    /// Detail-view URL, absolute, without query or fragment.
    Canonical(String),
    /// Position within one listing snapshot. Only unique inside that snapshot.
    Positional(usize),
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemIdentity::Canonical(url) => f.write_str(url),
            ItemIdentity::Positional(index) => write!(f, "item-{}", index),
        }
    }
}

/// Resolve a detail link against the page URL and drop tracking parameters.
pub fn canonical_identity(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Identities extracted so far in this run. Never shrinks.
#[derive(Debug, Default)]
pub struct ProcessedIdentitySet {
    seen: HashSet<ItemIdentity>,
}

impl ProcessedIdentitySet {
    pub fn contains(&self, identity: &ItemIdentity) -> bool {
        self.seen.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub(crate) fn insert(&mut self, identity: ItemIdentity) -> bool {
        self.seen.insert(identity)
    }
}

/// Records and counters for one listing page pass.
#[derive(Debug, Default)]
pub struct PageSession {
    records: Vec<ListingRecord>,
    pub duplicates: usize,
    pub failures: usize,
}

impl PageSession {
    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }

    fn push(&mut self, record: ListingRecord) {
        self.records.push(record);
    }
}

/// One card found in a listing snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingCard {
    pub index: usize,
    pub identity: ItemIdentity,
}

/// Enumerate cards in document order with their identities.
pub fn enumerate_cards(
    html: &str,
    selectors: &ListingSelectors,
    base: Option<&Url>,
) -> Vec<ListingCard> {
    let snapshot = MarkupSnapshot::parse(html);
    snapshot
        .query(&selectors.item)
        .into_iter()
        .enumerate()
        .map(|(index, card)| {
            let identity = query_within(card, &selectors.item_link)
                .into_iter()
                .find_map(|a| a.value().attr("href"))
                .and_then(|href| canonical_identity(href, base))
                .map(ItemIdentity::Canonical)
                .unwrap_or(ItemIdentity::Positional(index));
            ListingCard { index, identity }
        })
        .collect()
}

pub struct ItemNavigator<'a> {
    selectors: &'a ListingSelectors,
    timings: &'a Timings,
    extractor: &'a FieldExtractor,
}

impl<'a> ItemNavigator<'a> {
    pub fn new(
        selectors: &'a ListingSelectors,
        timings: &'a Timings,
        extractor: &'a FieldExtractor,
    ) -> Self {
        Self {
            selectors,
            timings,
            extractor,
        }
    }

    /// Visit every card currently in the listing once.
    ///
    /// Item failures are logged and skipped; this never returns an error.
    pub async fn process_listing(
        &self,
        session: &mut dyn BrowserSession,
        processed: &mut ProcessedIdentitySet,
    ) -> PageSession {
        let mut page = PageSession::default();

        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("❌ Could not capture listing markup: {}", e);
                return page;
            }
        };
        let base = match session.current_url().await {
            Ok(url) => url.and_then(|u| Url::parse(&u).ok()),
            Err(e) => {
                debug!("current_url unavailable, links resolved as absolute only: {}", e);
                None
            }
        };

        let cards = enumerate_cards(&html, self.selectors, base.as_ref());
        info!("📦 Total items to process: {}", cards.len());

        for card in cards {
            if processed.contains(&card.identity) {
                debug!("⏩ Skipping duplicate item #{} ({})", card.index + 1, card.identity);
                page.duplicates += 1;
                continue;
            }

            info!("➡️ Opening item #{}", card.index + 1);
            match self.process_card(session, &card).await {
                Ok(record) => {
                    info!("✅ Extracted: {}", record.summary());
                    processed.insert(card.identity);
                    page.push(record);
                }
                Err(e) => {
                    warn!("❌ Failed to process item #{}: {}", card.index + 1, e);
                    page.failures += 1;
                }
            }
        }

        info!(
            "Listing pass done: {} extracted, {} duplicates, {} failed",
            page.len(),
            page.duplicates,
            page.failures
        );
        page
    }

    async fn process_card(
        &self,
        session: &mut dyn BrowserSession,
        card: &ListingCard,
    ) -> Result<ListingRecord, ItemError> {
        let item = Locator::css(self.selectors.item.as_str());
        session.activate_nth(&item, card.index).await?;

        let marker = &self.selectors.detail_marker;
        match session.wait_for(marker, self.timings.detail_timeout).await? {
            WaitOutcome::Present { waited } => {
                debug!("detail view ready after {:?}", waited);
            }
            WaitOutcome::TimedOut { waited } => {
                return Err(ItemError::Timeout {
                    marker: marker.to_string(),
                    waited,
                });
            }
        }

        // The marker shows before the rest of the pane finishes rendering.
        tokio::time::sleep(self.timings.detail_settle).await;

        let html = session.content().await?;
        Ok(self.extractor.extract(&html))
    }
}
