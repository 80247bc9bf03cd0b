//! Studio configuration
//!
//! Values come from an optional `studio.toml` (path overridable through
//! `STUDIO_CONFIG`) and are then overridden by `STUDIO__*` environment
//! variables, e.g. `STUDIO__API_BASE_URL` or `STUDIO__REFRESH__COOLDOWN_MS`.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

/// What the synchronizer shows when the user owns no videos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Retry once against the unfiltered video collection
    #[default]
    AllVideos,
    /// Render the empty state straight away
    EmptyState,
}

/// How a pending thumbnail reaches the backend on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailDelivery {
    /// Embed the image in the update payload as a data URI
    #[default]
    Inline,
    /// Upload the image first, then reference the returned URL
    Upload,
}

/// Refresh coordinator timings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Minimum time between two executed refreshes
    pub cooldown_ms: u64,
    /// Cron schedule of the periodic refresh
    pub schedule: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 2000,
            schedule: "0 * * * * *".to_string(), // every 60 seconds
        }
    }
}

impl RefreshConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Pathway monitor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Cron schedule of the periodic diagnostics run
    pub schedule: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            schedule: "0/30 * * * * *".to_string(), // every 30 seconds
        }
    }
}

/// Studio configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Backend REST API base URL, e.g. `http://localhost:5000/api`
    pub api_base_url: String,
    /// Base URL that relative video file paths are resolved against
    pub uploads_base_url: String,
    /// Login page users are redirected to when no session exists
    pub login_page: String,
    /// Page the studio is served from, passed back as the login redirect target
    pub studio_page: String,
    /// Named page routes
    pub pages: BTreeMap<String, String>,
    /// Named backend endpoints, relative to `api_base_url`
    pub endpoints: BTreeMap<String, String>,
    /// Named storage keys
    pub storage: BTreeMap<String, String>,
    /// Storage key holding the authenticated session
    pub session_key: String,
    pub fallback_policy: FallbackPolicy,
    pub thumbnail_delivery: ThumbnailDelivery,
    pub refresh: RefreshConfig,
    pub monitor: MonitorConfig,
    /// Address the HTTP surface listens on
    pub listen_addr: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        let pages = [
            ("home", "index.html"),
            ("watch", "watch.html"),
            ("upload", "upload.html"),
            ("studio", "creator-studio.html"),
            ("login", "login.html"),
        ];
        let endpoints = [
            ("health", "/health"),
            ("videos", "/videos"),
            ("analytics", "/creator-analytics"),
        ];
        let storage = [
            ("session", "bhuban_session"),
            ("scheduledVideos", "scheduled_videos"),
            ("collaborators", "collaborators"),
            ("invitations", "collaborator_invitations"),
            ("library", "content_library"),
            ("folders", "library_folders"),
            ("abTests", "ab_tests"),
        ];

        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            uploads_base_url: "http://localhost:5000/uploads".to_string(),
            login_page: "/login.html".to_string(),
            studio_page: "/creator-studio.html".to_string(),
            pages: to_map(&pages),
            endpoints: to_map(&endpoints),
            storage: to_map(&storage),
            session_key: "bhuban_session".to_string(),
            fallback_policy: FallbackPolicy::default(),
            thumbnail_delivery: ThumbnailDelivery::default(),
            refresh: RefreshConfig::default(),
            monitor: MonitorConfig::default(),
            listen_addr: "0.0.0.0:3002".to_string(),
        }
    }
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

impl StudioConfig {
    /// Load the configuration from the optional file and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("STUDIO_CONFIG").unwrap_or_else(|_| "studio".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(config::Environment::with_prefix("STUDIO").separator("__"))
            .build()?
            .try_deserialize::<StudioConfig>()?;

        Ok(config)
    }

    /// Full URL of a named endpoint
    pub fn endpoint_url(&self, name: &str) -> Option<String> {
        self.endpoints
            .get(name)
            .map(|path| format!("{}{}", self.api_base_url.trim_end_matches('/'), path))
    }

    /// Configured storage key for a named collection, the name itself when unset
    pub fn storage_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.storage.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Login URL carrying the studio page as redirect target
    pub fn login_redirect(&self) -> String {
        format!(
            "{}?redirect={}",
            self.login_page,
            percent_encoding::utf8_percent_encode(
                &self.studio_page,
                percent_encoding::NON_ALPHANUMERIC
            )
        )
    }
}
