//! Video list synchronizer
//!
//! Fetches the signed-in creator's videos once and renders every surface
//! that lists them from that one snapshot.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::analytics;
use crate::api::VideoApi;
use crate::auth::AuthService;
use crate::config::FallbackPolicy;
use crate::models::SessionUser;
use crate::models::video::Video;
use crate::render::{self, DashboardMetrics, SurfaceId, Surfaces};

/// Anything that can re-run the video synchronization
pub trait Synchronize: Send + Sync {
    fn synchronize(&self) -> impl Future<Output = SyncOutcome> + Send;
}

/// Where the rendered snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    /// Videos owned by the signed-in user
    Owned,
    /// Unfiltered collection used as fallback
    AllVideos,
}

/// Result of one synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No session; the caller should send the user to `redirect`
    LoginRequired { redirect: String },
    Rendered { count: usize, source: VideoSource },
    /// Nothing to show; the empty state was rendered
    Empty,
    /// The primary request failed; the error was rendered inline
    Failed { message: String },
}

pub struct VideoSynchronizer<A, U> {
    api: Arc<A>,
    auth: Arc<U>,
    surfaces: Surfaces,
    policy: FallbackPolicy,
    login_redirect: String,
    upload_page: String,
}

impl<A: VideoApi, U: AuthService> VideoSynchronizer<A, U> {
    pub fn new(
        api: Arc<A>,
        auth: Arc<U>,
        surfaces: Surfaces,
        policy: FallbackPolicy,
        login_redirect: impl Into<String>,
        upload_page: impl Into<String>,
    ) -> Self {
        Self {
            api,
            auth,
            surfaces,
            policy,
            login_redirect: login_redirect.into(),
            upload_page: upload_page.into(),
        }
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    async fn run(&self) -> SyncOutcome {
        let session = match self.auth.get_session_data().await {
            Some(session) if session.is_valid() => session,
            _ => {
                info!("No authenticated session, login required");
                return SyncOutcome::LoginRequired {
                    redirect: self.login_redirect.clone(),
                };
            }
        };
        let user_id = session.user.user_id().unwrap_or_default();

        self.surfaces
            .replace(SurfaceId::ContentTable, render::loading())
            .await;

        info!("Loading videos for user {}", user_id);
        let envelope = match self.api.list_videos(&session.token, Some(user_id)).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Error loading videos: {}", e);
                let message = e.to_string();
                self.surfaces
                    .replace(SurfaceId::ContentTable, render::error_message(&message))
                    .await;
                return SyncOutcome::Failed { message };
            }
        };

        let owned = if envelope.success {
            envelope.data.unwrap_or_default()
        } else {
            warn!(
                "Video list request unsuccessful: {}",
                envelope.message.as_deref().unwrap_or("no message")
            );
            Vec::new()
        };

        let (videos, source) = if !owned.is_empty() {
            (owned, VideoSource::Owned)
        } else {
            match self.policy {
                FallbackPolicy::AllVideos => {
                    info!("No videos for user {}, falling back to all videos", user_id);
                    (self.fetch_all(&session.token).await, VideoSource::AllVideos)
                }
                FallbackPolicy::EmptyState => (Vec::new(), VideoSource::Owned),
            }
        };

        if videos.is_empty() {
            self.render_empty(&session.user).await;
            return SyncOutcome::Empty;
        }

        self.render_snapshot(&videos, &session.user).await;
        info!("Rendered {} videos", videos.len());
        SyncOutcome::Rendered {
            count: videos.len(),
            source,
        }
    }

    /// One unfiltered retry; any failure counts as empty
    async fn fetch_all(&self, token: &str) -> Vec<Video> {
        match self.api.list_videos(token, None).await {
            Ok(envelope) if envelope.success => envelope.data.unwrap_or_default(),
            Ok(envelope) => {
                warn!(
                    "Fallback video list unsuccessful: {}",
                    envelope.message.as_deref().unwrap_or("no message")
                );
                Vec::new()
            }
            Err(e) => {
                warn!("Fallback video list failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn render_snapshot(&self, videos: &[Video], user: &SessionUser) {
        self.surfaces
            .replace(SurfaceId::ContentTable, render::content_table(videos))
            .await;
        self.surfaces
            .replace(SurfaceId::DashboardPreview, render::dashboard_preview(videos))
            .await;

        let ranked = analytics::rank_by_views(videos);
        self.surfaces
            .replace(SurfaceId::TopContent, render::top_content(&ranked))
            .await;
        self.surfaces
            .replace(SurfaceId::RealtimeContent, render::realtime_content(&ranked))
            .await;
        self.surfaces
            .replace(SurfaceId::PopularVideos, render::popular_videos(&ranked))
            .await;

        self.surfaces.set_metrics(dashboard_metrics(videos, user)).await;
    }

    async fn render_empty(&self, user: &SessionUser) {
        self.surfaces
            .replace(SurfaceId::ContentTable, render::empty_state(&self.upload_page))
            .await;
        self.surfaces
            .replace(SurfaceId::DashboardPreview, String::new())
            .await;
        for id in [
            SurfaceId::TopContent,
            SurfaceId::RealtimeContent,
            SurfaceId::PopularVideos,
        ] {
            self.surfaces.replace(id, render::no_analytics_data()).await;
        }
        self.surfaces.set_metrics(dashboard_metrics(&[], user)).await;
    }
}

impl<A: VideoApi, U: AuthService> Synchronize for VideoSynchronizer<A, U> {
    async fn synchronize(&self) -> SyncOutcome {
        self.run().await
    }
}

/// Dashboard totals for a snapshot
pub fn dashboard_metrics(videos: &[Video], user: &SessionUser) -> DashboardMetrics {
    let views: u64 = videos.iter().map(|video| video.views).sum();
    let likes: u64 = videos.iter().map(|video| video.likes).sum();

    DashboardMetrics {
        view_count: render::format_count(views),
        like_count: render::format_count(likes),
        sub_count: render::format_count(user.subscribers),
        video_count: videos.len(),
        revenue_amount: "$0.00".to_string(),
        total_views: views,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ApiCall, FakeVideoApi, StaticAuth, video};

    fn synchronizer(
        api: Arc<FakeVideoApi>,
        auth: StaticAuth,
        policy: FallbackPolicy,
    ) -> VideoSynchronizer<FakeVideoApi, StaticAuth> {
        VideoSynchronizer::new(
            api,
            Arc::new(auth),
            Surfaces::new(),
            policy,
            "/login.html?redirect=%2Fcreator%2Dstudio%2Ehtml",
            "upload.html",
        )
    }

    #[tokio::test]
    async fn test_signed_out_requires_login_without_fetching() {
        let api = Arc::new(FakeVideoApi::new());
        let sync = synchronizer(api.clone(), StaticAuth::signed_out(), FallbackPolicy::AllVideos);

        let outcome = sync.synchronize().await;
        assert_eq!(
            outcome,
            SyncOutcome::LoginRequired {
                redirect: "/login.html?redirect=%2Fcreator%2Dstudio%2Ehtml".to_string()
            }
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_owned_videos_render_every_surface() {
        let mut top = video("v2", 900);
        top.likes = 40;
        let api = Arc::new(FakeVideoApi::with_videos(
            vec![video("v1", 100), top],
            Vec::new(),
        ));
        let sync = synchronizer(api.clone(), StaticAuth::signed_in("u1"), FallbackPolicy::AllVideos);

        let outcome = sync.synchronize().await;
        assert_eq!(
            outcome,
            SyncOutcome::Rendered {
                count: 2,
                source: VideoSource::Owned
            }
        );
        assert_eq!(
            api.calls(),
            vec![ApiCall::List {
                user: Some("u1".to_string())
            }]
        );

        let surfaces = sync.surfaces();
        assert!(surfaces.get(SurfaceId::ContentTable).await.contains("data-video-id=\"v1\""));
        assert!(surfaces.get(SurfaceId::DashboardPreview).await.contains("Video v2"));
        let top_content = surfaces.get(SurfaceId::TopContent).await;
        assert!(top_content.find("v2").unwrap() < top_content.find("v1").unwrap());

        let metrics = surfaces.metrics().await.unwrap();
        assert_eq!(metrics.view_count, "1,000");
        assert_eq!(metrics.like_count, "40");
        assert_eq!(metrics.sub_count, "1,200");
        assert_eq!(metrics.video_count, 2);
        assert_eq!(metrics.revenue_amount, "$0.00");
    }

    #[tokio::test]
    async fn test_falls_back_to_all_videos() {
        let api = Arc::new(FakeVideoApi::with_videos(Vec::new(), vec![video("x", 1)]));
        let sync = synchronizer(api.clone(), StaticAuth::signed_in("u1"), FallbackPolicy::AllVideos);

        let outcome = sync.synchronize().await;
        assert_eq!(
            outcome,
            SyncOutcome::Rendered {
                count: 1,
                source: VideoSource::AllVideos
            }
        );
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_both_empty_renders_empty_state() {
        let api = Arc::new(FakeVideoApi::new());
        let sync = synchronizer(api.clone(), StaticAuth::signed_in("u1"), FallbackPolicy::AllVideos);
        sync.surfaces()
            .replace(SurfaceId::DashboardPreview, "stale".to_string())
            .await;

        assert_eq!(sync.synchronize().await, SyncOutcome::Empty);
        assert_eq!(api.list_calls(), 2);

        let table = sync.surfaces().get(SurfaceId::ContentTable).await;
        assert!(table.contains("No videos yet"));
        assert!(table.contains(r#"href="upload.html""#));
        assert_eq!(sync.surfaces().get(SurfaceId::DashboardPreview).await, "");
    }

    #[tokio::test]
    async fn test_empty_state_policy_skips_fallback() {
        let api = Arc::new(FakeVideoApi::with_videos(Vec::new(), vec![video("x", 1)]));
        let sync = synchronizer(api.clone(), StaticAuth::signed_in("u1"), FallbackPolicy::EmptyState);

        assert_eq!(sync.synchronize().await, SyncOutcome::Empty);
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_request_failure_renders_inline_error() {
        let api = Arc::new(FakeVideoApi::new());
        api.fail_list();
        let sync = synchronizer(api.clone(), StaticAuth::signed_in("u1"), FallbackPolicy::AllVideos);

        let outcome = sync.synchronize().await;
        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert_eq!(api.list_calls(), 1);
        assert!(
            sync.surfaces()
                .get(SurfaceId::ContentTable)
                .await
                .contains("Error loading videos")
        );
    }
}
