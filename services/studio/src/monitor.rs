//! Pathway monitor: periodic self-test of routes, backend and storage

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::store::KeyValueStore;
use reqwest::Url;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{RwLock, broadcast};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::api::VideoApi;
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathwayStatus {
    Valid,
    Warning,
    Error,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathwayKind {
    Navigation,
    Api,
    Storage,
    File,
}

/// Result of one pathway check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayCheck {
    #[serde(rename = "type")]
    pub kind: PathwayKind,
    pub name: String,
    /// Path, endpoint or storage key that was checked
    pub target: String,
    pub status: PathwayStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl PathwayCheck {
    fn new(
        kind: PathwayKind,
        name: impl Into<String>,
        target: impl Into<String>,
        status: PathwayStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            target: target.into(),
            status,
            message: message.into(),
            response_time_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validations {
    pub navigation: Vec<PathwayCheck>,
    pub api: Vec<PathwayCheck>,
    pub storage: Vec<PathwayCheck>,
    pub files: Vec<PathwayCheck>,
}

impl Validations {
    fn iter(&self) -> impl Iterator<Item = &PathwayCheck> {
        self.navigation
            .iter()
            .chain(&self.api)
            .chain(&self.storage)
            .chain(&self.files)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendHealth {
    Healthy,
    Error,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub overall: Health,
    pub backend: BackendHealth,
    pub frontend: Health,
    pub pathways: Health,
    pub last_check: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayStats {
    pub total_pathways: usize,
    pub valid_pathways: usize,
    pub invalid_pathways: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCounts {
    pub api_base_url: String,
    pub total_pages: usize,
    pub total_endpoints: usize,
    pub total_storage_keys: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayReport {
    pub health: HealthStatus,
    pub validations: Validations,
    pub stats: PathwayStats,
    pub config: ConfigCounts,
    pub timestamp: DateTime<Utc>,
}

/// Short form of a report, published after every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub status: Health,
    pub message: String,
    pub stats: PathwayStats,
    pub last_check: DateTime<Utc>,
}

impl PathwayReport {
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            status: self.health.overall,
            message: health_message(self.health.overall, &self.stats),
            stats: self.stats,
            last_check: self.health.last_check,
        }
    }
}

/// Count check results: any error makes the whole set `Error`, otherwise
/// any warning makes it `Warning`. `Unknown` results count toward the total
/// only.
pub fn classify(validations: &Validations) -> (PathwayStats, Health) {
    let mut stats = PathwayStats::default();
    for check in validations.iter() {
        stats.total_pathways += 1;
        match check.status {
            PathwayStatus::Valid => stats.valid_pathways += 1,
            PathwayStatus::Error => stats.invalid_pathways += 1,
            PathwayStatus::Warning => stats.warnings += 1,
            PathwayStatus::Unknown => {}
        }
    }

    let health = if stats.invalid_pathways > 0 {
        Health::Error
    } else if stats.warnings > 0 {
        Health::Warning
    } else {
        Health::Healthy
    };
    (stats, health)
}

pub fn health_message(health: Health, stats: &PathwayStats) -> String {
    match health {
        Health::Healthy => "All systems operational".to_string(),
        Health::Warning => format!("{} warning(s) detected", stats.warnings),
        Health::Error => format!("{} error(s) detected", stats.invalid_pathways),
    }
}

pub struct PathwayMonitor<A, K> {
    config: Arc<StudioConfig>,
    api: Arc<A>,
    store: K,
    last_report: RwLock<Option<PathwayReport>>,
    notifications: broadcast::Sender<HealthSummary>,
}

impl<A: VideoApi, K: KeyValueStore> PathwayMonitor<A, K> {
    pub fn new(config: Arc<StudioConfig>, api: Arc<A>, store: K) -> Self {
        let (notifications, _) = broadcast::channel(8);
        Self {
            config,
            api,
            store,
            last_report: RwLock::new(None),
            notifications,
        }
    }

    /// Receive the summary of every subsequent run
    pub fn subscribe(&self) -> broadcast::Receiver<HealthSummary> {
        self.notifications.subscribe()
    }

    pub async fn report(&self) -> Option<PathwayReport> {
        self.last_report.read().await.clone()
    }

    pub async fn summary(&self) -> Option<HealthSummary> {
        self.last_report.read().await.as_ref().map(PathwayReport::summary)
    }

    /// Pretty-printed JSON of the latest report
    pub async fn export_json(&self) -> StudioResult<String> {
        let report = self
            .report()
            .await
            .ok_or_else(|| StudioError::NotFound("No pathway report yet".to_string()))?;
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Run every check, keep the report and notify subscribers
    pub async fn run(&self) -> PathwayReport {
        let last_check = Utc::now();

        let health_probe = self.api.health().await;
        let backend = match &health_probe {
            Ok(status) if (200..300).contains(status) => BackendHealth::Healthy,
            Ok(_) => BackendHealth::Error,
            Err(_) => BackendHealth::Offline,
        };

        let validations = Validations {
            navigation: self.check_navigation(),
            api: self.check_api(&health_probe).await,
            storage: self.check_storage().await,
            files: self.check_files(&health_probe),
        };
        let (stats, overall) = classify(&validations);

        let report = PathwayReport {
            health: HealthStatus {
                overall,
                backend,
                frontend: Health::Healthy,
                pathways: overall,
                last_check,
            },
            validations,
            stats,
            config: ConfigCounts {
                api_base_url: self.config.api_base_url.clone(),
                total_pages: self.config.pages.len(),
                total_endpoints: self.config.endpoints.len(),
                total_storage_keys: self.config.storage.len(),
            },
            timestamp: Utc::now(),
        };

        let summary = report.summary();
        info!(
            "Pathway diagnostics complete: {} ({}/{} valid)",
            summary.message, stats.valid_pathways, stats.total_pathways
        );
        *self.last_report.write().await = Some(report.clone());
        // No subscribers is fine
        let _ = self.notifications.send(summary);

        report
    }

    fn check_navigation(&self) -> Vec<PathwayCheck> {
        self.config
            .pages
            .iter()
            .map(|(name, path)| {
                let (status, message) = if path.starts_with("http") {
                    match Url::parse(path) {
                        Ok(_) => (PathwayStatus::Valid, "External URL".to_string()),
                        Err(e) => (PathwayStatus::Error, format!("Invalid URL: {}", e)),
                    }
                } else if path.ends_with(".html") {
                    (PathwayStatus::Valid, "Path format valid".to_string())
                } else {
                    (
                        PathwayStatus::Warning,
                        "Path does not end with .html".to_string(),
                    )
                };
                PathwayCheck::new(PathwayKind::Navigation, name, path, status, message)
            })
            .collect()
    }

    async fn check_api(&self, health_probe: &StudioResult<u16>) -> Vec<PathwayCheck> {
        let health_url = self.config.endpoint_url("health").unwrap_or_default();
        let health = match health_probe {
            Ok(status) if (200..300).contains(status) => PathwayCheck::new(
                PathwayKind::Api,
                "Backend Health",
                &health_url,
                PathwayStatus::Valid,
                format!("Backend online ({})", status),
            ),
            Ok(status) => PathwayCheck::new(
                PathwayKind::Api,
                "Backend Health",
                &health_url,
                PathwayStatus::Error,
                format!("Backend error ({})", status),
            ),
            Err(e) => PathwayCheck::new(
                PathwayKind::Api,
                "Backend Health",
                &health_url,
                PathwayStatus::Error,
                format!("Backend offline: {}", e),
            ),
        };

        let videos_url = self.config.endpoint_url("videos").unwrap_or_default();
        let started = Instant::now();
        let videos = match self.api.list_videos("", None).await {
            Ok(envelope) => {
                let elapsed = started.elapsed().as_millis() as u64;
                let count = envelope.data.map(|videos| videos.len()).unwrap_or(0);
                let mut check = PathwayCheck::new(
                    PathwayKind::Api,
                    "Videos API",
                    &videos_url,
                    PathwayStatus::Valid,
                    format!("Returned {} videos in {}ms", count, elapsed),
                );
                check.response_time_ms = Some(elapsed);
                check
            }
            Err(e) => PathwayCheck::new(
                PathwayKind::Api,
                "Videos API",
                &videos_url,
                PathwayStatus::Error,
                e.to_string(),
            ),
        };

        vec![health, videos]
    }

    async fn check_storage(&self) -> Vec<PathwayCheck> {
        let mut checks = Vec::with_capacity(self.config.storage.len());
        for (name, key) in &self.config.storage {
            let (status, mut message) = match self.round_trip(key).await {
                Ok(true) => (PathwayStatus::Valid, "Read/write successful".to_string()),
                Ok(false) => (
                    PathwayStatus::Error,
                    "Failed to retrieve test data".to_string(),
                ),
                Err(e) => {
                    warn!("Storage check for {} failed: {}", key, e);
                    (PathwayStatus::Error, e.to_string())
                }
            };

            if let Ok(Some(existing)) = self.store.get(key).await {
                message.push_str(&format!(" ({:.2}KB stored)", existing.len() as f64 / 1024.0));
            }

            checks.push(PathwayCheck::new(
                PathwayKind::Storage,
                name,
                key,
                status,
                message,
            ));
        }
        checks
    }

    /// Write, read back and remove `<key>_test`
    async fn round_trip(&self, key: &str) -> StudioResult<bool> {
        let test_key = format!("{}_test", key);
        let probe = json!({"test": true, "timestamp": Utc::now().timestamp_millis()});

        self.store.set(&test_key, &probe.to_string()).await?;
        let retrieved = self.store.get(&test_key).await?;
        self.store.delete(&test_key).await?;

        let retrieved = retrieved
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()?;
        Ok(retrieved.is_some_and(|value| value["test"] == json!(true)))
    }

    fn check_files(&self, health_probe: &StudioResult<u16>) -> Vec<PathwayCheck> {
        let config = PathwayCheck::new(
            PathwayKind::File,
            "studio config",
            "studio.toml",
            PathwayStatus::Valid,
            "Loaded successfully",
        );

        let (status, message) = match health_probe {
            Ok(status) if (200..300).contains(status) => {
                (PathwayStatus::Valid, "Backend operational")
            }
            Ok(_) => (PathwayStatus::Unknown, "Cannot verify"),
            Err(_) => (PathwayStatus::Unknown, "Backend offline"),
        };
        let backend = PathwayCheck::new(
            PathwayKind::File,
            "backend",
            self.config.api_base_url.as_str(),
            status,
            message,
        );

        vec![config, backend]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeVideoApi, video};
    use common::store::MemoryStore;

    fn check(status: PathwayStatus) -> PathwayCheck {
        PathwayCheck::new(PathwayKind::Navigation, "n", "p", status, "")
    }

    #[test]
    fn test_classify() {
        let mut validations = Validations {
            navigation: vec![check(PathwayStatus::Valid), check(PathwayStatus::Unknown)],
            ..Validations::default()
        };
        let (stats, health) = classify(&validations);
        assert_eq!(health, Health::Healthy);
        assert_eq!(stats.total_pathways, 2);
        assert_eq!(stats.valid_pathways, 1);

        validations.storage.push(check(PathwayStatus::Warning));
        assert_eq!(classify(&validations).1, Health::Warning);

        validations.api.push(check(PathwayStatus::Error));
        let (stats, health) = classify(&validations);
        assert_eq!(health, Health::Error);
        assert_eq!(health_message(health, &stats), "1 error(s) detected");
    }

    fn monitor(api: FakeVideoApi, store: MemoryStore) -> PathwayMonitor<FakeVideoApi, MemoryStore> {
        PathwayMonitor::new(Arc::new(StudioConfig::default()), Arc::new(api), store)
    }

    #[tokio::test]
    async fn test_healthy_run() {
        let api = FakeVideoApi::with_videos(Vec::new(), vec![video("a", 1), video("b", 2)]);
        let monitor = monitor(api, MemoryStore::new());
        let mut notifications = monitor.subscribe();

        let report = monitor.run().await;
        assert_eq!(report.health.overall, Health::Healthy);
        assert_eq!(report.health.backend, BackendHealth::Healthy);
        assert!(report.validations.api[1].message.starts_with("Returned 2 videos in"));
        assert_eq!(report.config.total_pages, 5);
        assert_eq!(report.stats.total_pathways, 5 + 2 + 7 + 2);

        let summary = notifications.recv().await.unwrap();
        assert_eq!(summary.message, "All systems operational");
    }

    #[tokio::test]
    async fn test_offline_backend_is_error() {
        let api = FakeVideoApi::new();
        api.go_offline();
        let monitor = monitor(api, MemoryStore::new());

        let report = monitor.run().await;
        assert_eq!(report.health.overall, Health::Error);
        assert_eq!(report.health.backend, BackendHealth::Offline);
        assert_eq!(report.validations.files[1].status, PathwayStatus::Unknown);
        assert_eq!(report.summary().message, "1 error(s) detected");
    }

    #[tokio::test]
    async fn test_navigation_warning() {
        let mut config = StudioConfig::default();
        config.pages.insert("about".to_string(), "about".to_string());
        config
            .pages
            .insert("docs".to_string(), "https://docs.example.com".to_string());
        let monitor = PathwayMonitor::new(
            Arc::new(config),
            Arc::new(FakeVideoApi::new()),
            MemoryStore::new(),
        );

        let report = monitor.run().await;
        assert_eq!(report.health.overall, Health::Warning);
        assert_eq!(report.summary().message, "1 warning(s) detected");
        let docs = report
            .validations
            .navigation
            .iter()
            .find(|check| check.name == "docs")
            .unwrap();
        assert_eq!(docs.message, "External URL");
    }

    #[tokio::test]
    async fn test_storage_check_cleans_up_and_reports_size() {
        let store = MemoryStore::new();
        store.set("ab_tests", &"x".repeat(2048)).await.unwrap();
        let monitor = monitor(FakeVideoApi::new(), store.clone());

        let report = monitor.run().await;
        let ab_tests = report
            .validations
            .storage
            .iter()
            .find(|check| check.target == "ab_tests")
            .unwrap();
        assert_eq!(ab_tests.message, "Read/write successful (2.00KB stored)");
        assert_eq!(store.get("ab_tests_test").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_export_json() {
        let monitor = monitor(FakeVideoApi::new(), MemoryStore::new());
        assert!(monitor.export_json().await.is_err());

        monitor.run().await;
        let exported: serde_json::Value =
            serde_json::from_str(&monitor.export_json().await.unwrap()).unwrap();
        assert_eq!(exported["health"]["overall"], "healthy");
        assert_eq!(exported["config"]["totalStorageKeys"], 7);
    }
}
