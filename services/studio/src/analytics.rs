//! Creator analytics: engagement scoring, rankings, and backend reports

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::{AnalyticsReport, VideoApi};
use crate::auth::AuthService;
use crate::models::video::Video;

/// Engagement score in `0..=100`.
///
/// Like and comment rates are percentages of views; comments weigh four
/// times as much as likes. A video without views scores 0.
pub fn engagement_score(video: &Video) -> u32 {
    if video.views == 0 {
        return 0;
    }

    let views = video.views as f64;
    let like_rate = video.likes as f64 / views * 100.0;
    let comment_rate = video.comments as f64 / views * 100.0;

    (like_rate * 50.0 + comment_rate * 200.0).floor().min(100.0) as u32
}

/// Revenue per thousand views, rounded to cents; 0 without views
pub fn cpm(views: u64, revenue: f64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (revenue / views as f64 * 1000.0 * 100.0).round() / 100.0
}

/// Percentage of `max` reached by `value`, rounded
pub fn share_of_max(value: u64, max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    ((value as f64 / max as f64) * 100.0).round() as u64
}

/// Videos ordered by views, most viewed first; ties keep snapshot order
pub fn rank_by_views(videos: &[Video]) -> Vec<&Video> {
    let mut ranked: Vec<&Video> = videos.iter().collect();
    ranked.sort_by(|a, b| b.views.cmp(&a.views));
    ranked
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub age: HashMap<String, f64>,
    pub gender: HashMap<String, f64>,
    pub location: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudienceInsights {
    pub demographics: Demographics,
    pub interests: Vec<String>,
    pub watch_time: f64,
    pub retention: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevenueBreakdown {
    pub total: f64,
    pub ads: f64,
    pub memberships: f64,
    pub super_chat: f64,
    pub merchandise: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealtimeMetrics {
    pub live_viewers: u64,
    pub views_last_hour: u64,
    pub revenue_today: f64,
    pub new_subscribers: u64,
}

/// Backend analytics reports; any failure yields zeroed defaults
pub struct CreatorAnalytics<A, U> {
    api: Arc<A>,
    auth: Arc<U>,
}

impl<A: VideoApi, U: AuthService> CreatorAnalytics<A, U> {
    pub fn new(api: Arc<A>, auth: Arc<U>) -> Self {
        Self { api, auth }
    }

    pub async fn audience_insights(&self) -> AudienceInsights {
        self.fetch_or_default(AnalyticsReport::Audience).await
    }

    pub async fn revenue_breakdown(&self) -> RevenueBreakdown {
        self.fetch_or_default(AnalyticsReport::Revenue).await
    }

    pub async fn realtime_metrics(&self) -> RealtimeMetrics {
        self.fetch_or_default(AnalyticsReport::Realtime).await
    }

    async fn fetch_or_default<T: DeserializeOwned + Default>(&self, report: AnalyticsReport) -> T {
        info!("Fetching {} analytics", report);
        let token = self
            .auth
            .get_session_data()
            .await
            .map(|session| session.token)
            .unwrap_or_default();

        match self.api.analytics(&token, report).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                error!("Malformed {} analytics: {}", report, e);
                T::default()
            }),
            Err(e) => {
                error!("{} analytics error: {}", report, e);
                T::default()
            }
        }
    }
}
