use crate::core::config::ScoutConfig;
use crate::pipeline::Harvester;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub harvester: Arc<Harvester>,
    /// One browser session at a time: concurrent logins on the same account
    /// invalidate each other.
    pub run_lock: Arc<tokio::sync::Mutex<()>>,
    /// File-based config loaded from `listing-scout.json` (env-var fallback for all fields).
    pub config: Arc<ScoutConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pagination", &self.harvester.pagination())
            .field("run_in_progress", &self.run_lock.try_lock().is_err())
            .finish()
    }
}

impl AppState {
    pub fn new(config: ScoutConfig) -> Self {
        Self {
            harvester: Arc::new(Harvester::new(config.clone())),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            config: Arc::new(config),
        }
    }
}
