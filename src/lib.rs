pub mod core;
pub mod export;
pub mod extraction;
pub mod pipeline;
pub mod scraping;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::AppState;
pub use core::{HarvestError, ItemError, SessionError};
pub use pipeline::{HarvestReport, Harvester};
