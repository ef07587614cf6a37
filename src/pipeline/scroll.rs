//! Infinite-scroll convergence.
//!
//! Each attempt scrolls the results container and the document to the
//! bottom, waits for lazy loading to settle and recounts the items. The loop
//! stops when an attempt adds nothing (converged) or the attempt budget runs
//! out (exhausted). Both outcomes are successes: the caller proceeds with
//! whatever is loaded.

use crate::scraping::session::{BrowserSession, Locator};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MAX_SCROLL_ATTEMPTS: u32 = 50;

#[derive(Clone, Debug)]
pub struct ScrollSettings {
    pub list_container: Locator,
    pub item: Locator,
    pub pause: Duration,
    pub max_attempts: u32,
}

/// Counters for one convergence run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub attempt: u32,
    pub last_count: usize,
    pub current_count: usize,
}

impl ScrollState {
    /// Record one attempt's observation; returns `true` when nothing new loaded.
    ///
    /// The list is append-only during a run, so a lower recount (virtualised
    /// rows leaving the DOM) is clamped to the previous high-water mark.
    fn observe(&mut self, observed: usize) -> bool {
        self.attempt += 1;
        self.last_count = self.current_count;
        if observed < self.current_count {
            warn!(
                "Scroll #{}: item count dropped {} → {}; keeping {}",
                self.attempt, self.current_count, observed, self.current_count
            );
        }
        self.current_count = observed.max(self.current_count);
        self.current_count == self.last_count
    }

    /// Count the attempt without a fresh observation.
    fn skip(&mut self) {
        self.attempt += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollOutcome {
    Converged { attempts: u32, items: usize },
    AttemptsExhausted { attempts: u32, items: usize },
}

impl ScrollOutcome {
    pub fn items(&self) -> usize {
        match self {
            ScrollOutcome::Converged { items, .. } | ScrollOutcome::AttemptsExhausted { items, .. } => {
                *items
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ScrollOutcome::Converged { attempts, .. }
            | ScrollOutcome::AttemptsExhausted { attempts, .. } => *attempts,
        }
    }
}

/// Drive lazy loading until the item count stops growing.
pub async fn load_all_items(
    session: &mut dyn BrowserSession,
    settings: &ScrollSettings,
) -> ScrollOutcome {
    let mut state = ScrollState::default();

    while state.attempt < settings.max_attempts {
        info!(
            "🔄 Scroll #{}: loaded {} items so far...",
            state.attempt + 1,
            state.current_count
        );

        if let Err(e) = session.scroll_to_end(&settings.list_container).await {
            warn!("⚠️ Failed to scroll list container: {}", e);
        }
        if let Err(e) = session.scroll_document_to_end().await {
            warn!("⚠️ Failed to scroll document: {}", e);
        }
        tokio::time::sleep(settings.pause).await;

        match session.count(&settings.item).await {
            Ok(observed) => {
                if state.observe(observed) {
                    info!("✅ No new items loaded. Ending scroll.");
                    info!("🟢 All items loaded. Total: {}", state.current_count);
                    return ScrollOutcome::Converged {
                        attempts: state.attempt,
                        items: state.current_count,
                    };
                }
            }
            Err(e) => {
                state.skip();
                debug!("Scroll #{}: recount failed, retrying: {}", state.attempt, e);
            }
        }
    }

    warn!(
        "🟡 Scroll budget exhausted after {} attempts; continuing with {} items",
        state.attempt, state.current_count
    );
    ScrollOutcome::AttemptsExhausted {
        attempts: state.attempt,
        items: state.current_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::ScriptedSession;

    fn settings() -> ScrollSettings {
        ScrollSettings {
            list_container: Locator::css("div.results"),
            item: Locator::css("li.card"),
            pause: Duration::ZERO,
            max_attempts: MAX_SCROLL_ATTEMPTS,
        }
    }

    fn session(counts: &[usize]) -> ScriptedSession {
        let mut s = ScriptedSession::new(Locator::css("li.card"), Locator::css(".marker"))
            .with_counts(counts);
        s.present.insert(Locator::css("div.results"));
        s
    }

    #[tokio::test]
    async fn test_converges_when_count_repeats() {
        let mut s = session(&[4, 9, 9, 12]);
        let outcome = load_all_items(&mut s, &settings()).await;
        assert_eq!(
            outcome,
            ScrollOutcome::Converged {
                attempts: 3,
                items: 9
            }
        );
        assert_eq!(s.count_calls, 3, "no attempts after convergence");
        assert_eq!(s.events_starting_with("scroll ").len(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget_on_ever_growing_list() {
        let counts: Vec<usize> = (1..=80).map(|n| n * 7).collect();
        let mut s = session(&counts);
        let outcome = load_all_items(&mut s, &settings()).await;
        assert_eq!(
            outcome,
            ScrollOutcome::AttemptsExhausted {
                attempts: 50,
                items: 350
            }
        );
        assert_eq!(s.count_calls, 50);
    }

    #[tokio::test]
    async fn test_container_scroll_failure_is_not_fatal() {
        let mut s = session(&[3, 3]);
        s.present.clear();
        let outcome = load_all_items(&mut s, &settings()).await;
        assert_eq!(outcome.items(), 3);
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(s.events_starting_with("execute window.scrollTo").len(), 2);
    }

    #[tokio::test]
    async fn test_failed_recount_retries_within_budget() {
        let mut s = session(&[]);
        s.counts = vec![Some(5), None, Some(8), Some(8)].into();
        let outcome = load_all_items(&mut s, &settings()).await;
        assert_eq!(
            outcome,
            ScrollOutcome::Converged {
                attempts: 4,
                items: 8
            }
        );
    }

    #[tokio::test]
    async fn test_shrinking_count_is_clamped() {
        let mut s = session(&[10, 6]);
        let outcome = load_all_items(&mut s, &settings()).await;
        assert_eq!(
            outcome,
            ScrollOutcome::Converged {
                attempts: 2,
                items: 10
            }
        );
    }

    #[tokio::test]
    async fn test_empty_list_converges_immediately() {
        let mut s = session(&[0]);
        let outcome = load_all_items(&mut s, &settings()).await;
        assert_eq!(
            outcome,
            ScrollOutcome::Converged {
                attempts: 1,
                items: 0
            }
        );
    }
}
