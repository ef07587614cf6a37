pub mod browser_manager;
pub mod session;

pub use session::{BrowserSession, ChromiumSession, Locator, WaitOutcome};
