//! In-memory [`BrowserSession`] used by the pipeline tests.

use crate::core::error::SessionError;
use crate::scraping::session::{BrowserSession, Locator};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};

pub(crate) struct ScriptedSession {
    pub url: String,
    pub item: Locator,
    pub marker: Locator,
    /// Successive item counts; `None` makes that lookup fail. The last value repeats.
    pub counts: VecDeque<Option<usize>>,
    pub count_calls: usize,
    pub listing_html: String,
    /// Detail pane rendered after clicking card `i`. No entry ⇒ pane never appears.
    pub details: HashMap<usize, String>,
    pub broken_cards: HashSet<usize>,
    pub present: HashSet<Locator>,
    /// Clicking the key makes the value appear.
    pub reveals: HashMap<Locator, Locator>,
    pub failing_urls: HashSet<String>,
    pub opened: Option<usize>,
    pub events: Vec<String>,
    pub closed: bool,
}

impl ScriptedSession {
    pub fn new(item: Locator, marker: Locator) -> Self {
        Self {
            url: "https://www.linkedin.com/jobs/search/?keywords=rust".to_string(),
            item,
            marker,
            counts: VecDeque::new(),
            count_calls: 0,
            listing_html: String::new(),
            details: HashMap::new(),
            broken_cards: HashSet::new(),
            present: HashSet::new(),
            reveals: HashMap::new(),
            failing_urls: HashSet::new(),
            opened: None,
            events: Vec::new(),
            closed: false,
        }
    }

    pub fn with_counts(mut self, counts: &[usize]) -> Self {
        self.counts = counts.iter().copied().map(Some).collect();
        self
    }

    pub fn events_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn next_count(&mut self) -> Result<usize, SessionError> {
        self.count_calls += 1;
        let next = if self.counts.len() > 1 {
            self.counts.pop_front().flatten()
        } else {
            self.counts.front().copied().flatten()
        };
        next.ok_or_else(|| SessionError::Protocol("scripted count failure".into()))
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.events.push(format!("navigate {}", url));
        if self.failing_urls.contains(url) {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: "scripted".into(),
            });
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<Option<String>, SessionError> {
        Ok(Some(self.url.clone()))
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, SessionError> {
        if *locator == self.item {
            return self.next_count();
        }
        if *locator == self.marker {
            let open = self
                .opened
                .map(|i| self.details.contains_key(&i))
                .unwrap_or(false);
            return Ok(usize::from(open));
        }
        Ok(usize::from(self.present.contains(locator)))
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), SessionError> {
        if !self.present.contains(locator) {
            return Err(SessionError::ElementNotFound(locator.to_string()));
        }
        self.events.push(format!("click {}", locator));
        if let Some(revealed) = self.reveals.get(locator).cloned() {
            self.present.insert(revealed);
        }
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        if !self.present.contains(locator) {
            return Err(SessionError::ElementNotFound(locator.to_string()));
        }
        self.events.push(format!("type {} {}", locator, text));
        Ok(())
    }

    async fn scroll_to_end(&mut self, locator: &Locator) -> Result<(), SessionError> {
        self.events.push(format!("scroll {}", locator));
        if self.present.contains(locator) {
            Ok(())
        } else {
            Err(SessionError::ElementNotFound(locator.to_string()))
        }
    }

    async fn activate_nth(&mut self, locator: &Locator, index: usize) -> Result<(), SessionError> {
        self.events.push(format!("activate {}", index));
        if self.broken_cards.contains(&index) {
            return Err(SessionError::NotInteractable {
                locator: locator.to_string(),
                reason: "element click intercepted".into(),
            });
        }
        self.opened = Some(index);
        Ok(())
    }

    async fn execute(&mut self, script: &str) -> Result<serde_json::Value, SessionError> {
        self.events.push(format!("execute {}", script));
        Ok(serde_json::Value::Null)
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        let detail = self
            .opened
            .and_then(|i| self.details.get(&i))
            .cloned()
            .unwrap_or_default();
        Ok(format!(
            "<html><body><div class=\"list\">{}</div><div class=\"pane\">{}</div></body></html>",
            self.listing_html, detail
        ))
    }

    async fn close(&mut self) {
        self.events.push("close".to_string());
        self.closed = true;
    }
}

/// Listing markup with one card per entry; `Some(href)` adds a detail link.
pub(crate) fn listing_markup(links: &[Option<&str>]) -> String {
    links
        .iter()
        .map(|link| {
            let anchor = link
                .map(|href| format!(r#"<a href="{}">open</a>"#, href))
                .unwrap_or_else(|| "<span>promoted</span>".to_string());
            format!(
                r#"<li class="ember-view occludable-update scaffold-layout__list-item">{}</li>"#,
                anchor
            )
        })
        .collect()
}

/// Minimal detail pane carrying the marker element and a title.
pub(crate) fn detail_markup(company: &str, title: &str) -> String {
    format!(
        r#"<div class="job-details-jobs-unified-top-card__company-name"><a>{company}</a></div>
           <div class="job-details-jobs-unified-top-card__job-title"><h1>{title}</h1></div>"#
    )
}
