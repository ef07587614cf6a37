use crate::core::selectors::SiteSelectors;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (listing-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "LISTING_SCOUT_CONFIG";
pub const ENV_USERNAME: &str = "LISTING_SCOUT_USERNAME";
pub const ENV_PASSWORD: &str = "LISTING_SCOUT_PASSWORD";
pub const ENV_LOGIN_URL: &str = "LISTING_SCOUT_LOGIN_URL";
pub const ENV_PAGINATION: &str = "LISTING_SCOUT_PAGINATION";
pub const ENV_OUTPUT: &str = "LISTING_SCOUT_OUTPUT";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

pub const DEFAULT_LOGIN_URL: &str = "https://www.linkedin.com/login";
pub const DEFAULT_OUTPUT: &str = "listings.csv";

/// `credentials` key. Values are never logged.
#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username_set", &self.username.is_some())
            .field("password_set", &self.password.is_some())
            .finish()
    }
}

/// `browser` key.
#[derive(Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct BrowserSection {
    /// Explicit executable path; auto-discovery when unset.
    pub executable: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Set to `false` to watch the run in a visible window.
    pub headless: Option<bool>,
}

/// `timings` key. All values optional; see [`Timings::default`].
#[derive(Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct TimingSection {
    pub scroll_pause_ms: Option<u64>,
    pub max_scroll_attempts: Option<u32>,
    pub detail_timeout_secs: Option<u64>,
    pub detail_settle_ms: Option<u64>,
    pub login_page_settle_ms: Option<u64>,
    pub post_login_settle_ms: Option<u64>,
    pub pagination_timeout_secs: Option<u64>,
}

/// How the driver moves from one result page to the next.
#[derive(Deserialize, Serialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageAdvance {
    /// Re-run scroll + item navigation on the same loaded view for every page.
    /// Identities already processed on earlier passes are skipped.
    #[default]
    RepeatView,
    /// Click the numbered pagination control and wait for it to become active.
    NextPageControl,
}

impl PageAdvance {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "repeat_view" | "repeat" => Some(PageAdvance::RepeatView),
            "next_page_control" | "next_page" | "next" => Some(PageAdvance::NextPageControl),
            _ => None,
        }
    }
}

/// Top-level config loaded from `listing-scout.json`.
#[derive(Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ScoutConfig {
    pub credentials: CredentialsConfig,
    pub login_url: Option<String>,
    pub browser: BrowserSection,
    pub timings: TimingSection,
    pub pagination: Option<PageAdvance>,
    /// CSV export path. An explicit empty string disables export.
    pub output_csv: Option<String>,
    pub selectors: SiteSelectors,
}

/// Resolved login secret pair.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolved browser launch settings.
#[derive(Clone, Debug)]
pub struct BrowserSettings {
    pub executable: Option<String>,
    pub width: u32,
    pub height: u32,
    pub headless: bool,
}

/// Resolved delays and budgets used by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timings {
    pub scroll_pause: Duration,
    pub max_scroll_attempts: u32,
    pub detail_timeout: Duration,
    pub detail_settle: Duration,
    pub login_page_settle: Duration,
    pub post_login_settle: Duration,
    pub pagination_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            scroll_pause: Duration::from_secs(3),
            max_scroll_attempts: 50,
            detail_timeout: Duration::from_secs(10),
            detail_settle: Duration::from_secs(2),
            login_page_settle: Duration::from_secs(2),
            post_login_settle: Duration::from_secs(5),
            pagination_timeout: Duration::from_secs(10),
        }
    }
}

impl Timings {
    /// No settle delays or wait budgets. Used by the scripted-session tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            scroll_pause: Duration::ZERO,
            detail_timeout: Duration::ZERO,
            detail_settle: Duration::ZERO,
            login_page_settle: Duration::ZERO,
            post_login_settle: Duration::ZERO,
            pagination_timeout: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ScoutConfig {
    /// Credentials: JSON fields → `LISTING_SCOUT_USERNAME` / `LISTING_SCOUT_PASSWORD` → `None`.
    ///
    /// Both halves must resolve; a username without a password is treated as missing.
    pub fn resolve_credentials(&self) -> Option<Credentials> {
        let username = self
            .credentials
            .username
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_non_empty(ENV_USERNAME))?;
        let password = self
            .credentials
            .password
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| std::env::var(ENV_PASSWORD).ok().filter(|v| !v.is_empty()))?;
        Some(Credentials { username, password })
    }

    /// Login page: JSON field → `LISTING_SCOUT_LOGIN_URL` → LinkedIn login.
    pub fn resolve_login_url(&self) -> String {
        if let Some(u) = &self.login_url {
            if !u.trim().is_empty() {
                return u.clone();
            }
        }
        env_non_empty(ENV_LOGIN_URL).unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string())
    }

    /// Page advance: JSON field → `LISTING_SCOUT_PAGINATION` → `repeat_view`.
    pub fn resolve_pagination(&self) -> PageAdvance {
        if let Some(p) = self.pagination {
            return p;
        }
        env_non_empty(ENV_PAGINATION)
            .and_then(|v| PageAdvance::parse_str(&v))
            .unwrap_or_default()
    }

    /// CSV path: JSON field → `LISTING_SCOUT_OUTPUT` → `listings.csv`.
    /// An explicit empty string (in either place) disables export.
    pub fn resolve_output_csv(&self) -> Option<PathBuf> {
        let raw = match &self.output_csv {
            Some(v) => v.clone(),
            None => std::env::var(ENV_OUTPUT).unwrap_or_else(|_| DEFAULT_OUTPUT.to_string()),
        };
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    }

    pub fn resolve_browser(&self) -> BrowserSettings {
        BrowserSettings {
            executable: self
                .browser
                .executable
                .clone()
                .filter(|p| !p.trim().is_empty())
                .or_else(chrome_executable_override),
            width: self.browser.width.unwrap_or(1920),
            height: self.browser.height.unwrap_or(1080),
            headless: self.browser.headless.unwrap_or(true),
        }
    }

    pub fn resolve_timings(&self) -> Timings {
        let defaults = Timings::default();
        let t = &self.timings;
        Timings {
            scroll_pause: t
                .scroll_pause_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.scroll_pause),
            max_scroll_attempts: t
                .max_scroll_attempts
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_scroll_attempts),
            detail_timeout: t
                .detail_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.detail_timeout),
            detail_settle: t
                .detail_settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.detail_settle),
            login_page_settle: t
                .login_page_settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.login_page_settle),
            post_login_settle: t
                .post_login_settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.post_login_settle),
            pagination_timeout: t
                .pagination_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.pagination_timeout),
        }
    }
}

/// Load `listing-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `LISTING_SCOUT_CONFIG` env var path
/// 2. `./listing-scout.json`
/// 3. `../listing-scout.json`
/// 4. `~/.listing-scout/listing-scout.json`
///
/// Missing file → `ScoutConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_scout_config() -> ScoutConfig {
    let mut candidates = vec![
        PathBuf::from("listing-scout.json"),
        PathBuf::from("../listing-scout.json"),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".listing-scout").join("listing-scout.json"));
    }
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        if let Some(cfg) = load_scout_config_from(path) {
            return cfg;
        }
    }

    ScoutConfig::default()
}

/// Returns `None` when the file cannot be read; a malformed file yields defaults.
pub fn load_scout_config_from(path: &Path) -> Option<ScoutConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ScoutConfig>(&contents) {
        Ok(cfg) => {
            tracing::info!("listing-scout.json loaded from {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(
                "listing-scout.json parse error at {}: {}; using defaults",
                path.display(),
                e
            );
            Some(ScoutConfig::default())
        }
    }
}

/// Optional override for the Chromium-family browser executable.
///
/// Only returns a value when `CHROME_EXECUTABLE` is set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = env_non_empty(ENV_CHROME_EXECUTABLE)?;
    if Path::new(&p).exists() {
        Some(p)
    } else {
        None
    }
}
