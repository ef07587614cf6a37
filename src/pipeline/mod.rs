//! The harvesting pipeline: session driver, scroll convergence, per-item navigation.

pub mod driver;
pub mod navigator;
pub mod scroll;

#[cfg(test)]
mod testing;

pub use driver::{HarvestReport, Harvester};
pub use navigator::{ItemIdentity, ItemNavigator, PageSession, ProcessedIdentitySet};
pub use scroll::{load_all_items, ScrollOutcome, ScrollSettings, MAX_SCROLL_ATTEMPTS};
