//! Site markup contract.
//!
//! Defaults target the LinkedIn jobs search two-pane layout. Every value can
//! be overridden from the `selectors` key of `listing-scout.json` when the
//! markup drifts.

use crate::scraping::session::Locator;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub login: LoginSelectors,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
    pub pagination: PaginationSelectors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSelectors {
    pub username: Locator,
    pub password: Locator,
    pub submit: Locator,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            username: Locator::id("username"),
            password: Locator::id("password"),
            submit: Locator::xpath(r#"//button[@type="submit"]"#),
        }
    }
}

/// Selectors for the scrollable results list.
///
/// `item` is plain CSS because it is evaluated both against captured markup
/// and against the live page.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    pub list_container: Locator,
    pub item: String,
    /// Detail-view link inside one item, relative to the item element.
    pub item_link: String,
    /// Present once the detail pane for the clicked item has rendered.
    pub detail_marker: Locator,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        // Cards carry `ember-view occludable-update` plus one of several
        // layout classes depending on the A/B variant being served.
        let base = "li[class*='ember-view'][class*='occludable-update']";
        let item = [
            "scaffold-layout__list-item",
            "jobs-search-results__list-item",
            "job-card-container--clickable",
            "jobs-search-two-pane__job-card-container",
        ]
        .iter()
        .map(|variant| format!("{base}[class*='{variant}']"))
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            list_container: Locator::css("div[class*='jobs-search-results-list']"),
            item,
            item_link: "a[href*='/jobs/view/']".to_string(),
            detail_marker: Locator::css(".job-details-jobs-unified-top-card__company-name"),
        }
    }
}

/// Selectors consumed by [`crate::extraction::FieldExtractor`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub company: String,
    pub title: String,
    pub location: String,
    /// Ordered text nodes: index 2 is the posting age, index 4 the applicant count.
    pub tertiary_items: String,
    pub pills: String,
    pub description: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        let tertiary = ".job-details-jobs-unified-top-card__tertiary-description-container";
        Self {
            company: ".job-details-jobs-unified-top-card__company-name a".to_string(),
            title: ".job-details-jobs-unified-top-card__job-title h1".to_string(),
            location: format!("{tertiary} span.tvm__text"),
            tertiary_items: format!("{tertiary} span"),
            pills: ".job-details-preferences-and-skills__pill span[aria-hidden='true']".to_string(),
            description: "#job-details".to_string(),
        }
    }
}

/// Used only by the `next_page_control` page-advance strategy.
/// `{page}` is replaced by the 1-based number of the page being opened.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSelectors {
    pub page_button: String,
    pub active_page: String,
}

impl Default for PaginationSelectors {
    fn default() -> Self {
        Self {
            page_button: "button[aria-label='Page {page}']".to_string(),
            active_page:
                "li.artdeco-pagination__indicator--number.active button[aria-label='Page {page}']"
                    .to_string(),
        }
    }
}

impl PaginationSelectors {
    pub fn page_button_for(&self, page: usize) -> Locator {
        Locator::css(self.page_button.replace("{page}", &page.to_string()))
    }

    pub fn active_page_for(&self, page: usize) -> Locator {
        Locator::css(self.active_page.replace("{page}", &page.to_string()))
    }
}
