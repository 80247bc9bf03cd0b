//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::api::{AnalyticsReport, VideoApi};
use crate::auth::AuthService;
use crate::error::{StudioError, StudioResult};
use crate::models::video::{Video, VideoUpdate};
use crate::models::{ApiEnvelope, SessionData, SessionUser};
use crate::sync::{SyncOutcome, Synchronize};
use crate::thumbnail::ThumbnailFile;

pub fn video(id: &str, views: u64) -> Video {
    Video {
        id: id.to_string(),
        title: format!("Video {id}"),
        description: format!("About {id}"),
        visibility: Some("public".to_string()),
        status: None,
        category: Some("music".to_string()),
        thumbnail_url: None,
        thumbnail: None,
        video_url: None,
        url: None,
        views,
        likes: 0,
        comments: 0,
        created_at: None,
        is_short: false,
    }
}

/// Requests observed by [`FakeVideoApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    List { user: Option<String> },
    Get(String),
    Update(String, VideoUpdate),
    Delete(String),
    UploadThumbnail(String),
    Health,
    Analytics(AnalyticsReport),
}

#[derive(Default)]
struct FakeBackend {
    owned: Vec<Video>,
    all: Vec<Video>,
    fail_list: bool,
    fail_update: Option<String>,
    fail_delete: Option<String>,
    offline: bool,
    analytics: HashMap<&'static str, serde_json::Value>,
    calls: Vec<ApiCall>,
}

/// In-memory backend recording every request
#[derive(Default)]
pub struct FakeVideoApi {
    backend: Mutex<FakeBackend>,
}

impl FakeVideoApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend where `owned` belong to the user and `all` is the unfiltered collection
    pub fn with_videos(owned: Vec<Video>, all: Vec<Video>) -> Self {
        let api = Self::new();
        {
            let mut backend = api.backend.lock().unwrap();
            backend.owned = owned;
            backend.all = all;
        }
        api
    }

    pub fn fail_list(&self) {
        self.backend.lock().unwrap().fail_list = true;
    }

    pub fn fail_update(&self, message: &str) {
        self.backend.lock().unwrap().fail_update = Some(message.to_string());
    }

    pub fn fail_delete(&self, message: &str) {
        self.backend.lock().unwrap().fail_delete = Some(message.to_string());
    }

    pub fn go_offline(&self) {
        self.backend.lock().unwrap().offline = true;
    }

    pub fn set_analytics(&self, report: AnalyticsReport, value: serde_json::Value) {
        self.backend
            .lock()
            .unwrap()
            .analytics
            .insert(report.path(), value);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.backend.lock().unwrap().calls.clone()
    }

    pub fn updates(&self) -> Vec<(String, VideoUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Update(id, update) => Some((id, update)),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::List { .. }))
            .count()
    }

    fn record(&self, call: ApiCall) {
        self.backend.lock().unwrap().calls.push(call);
    }
}

impl VideoApi for FakeVideoApi {
    async fn list_videos(
        &self,
        _token: &str,
        user_id: Option<&str>,
    ) -> StudioResult<ApiEnvelope<Vec<Video>>> {
        self.record(ApiCall::List {
            user: user_id.map(str::to_string),
        });
        let backend = self.backend.lock().unwrap();
        if backend.fail_list {
            return Err(StudioError::UnexpectedStatus {
                status: 500,
                body: "boom".to_string(),
            });
        }
        let videos = if user_id.is_some() {
            backend.owned.clone()
        } else {
            backend.all.clone()
        };
        Ok(ApiEnvelope::ok(videos))
    }

    async fn get_video(&self, _token: &str, id: &str) -> StudioResult<Video> {
        self.record(ApiCall::Get(id.to_string()));
        let backend = self.backend.lock().unwrap();
        backend
            .owned
            .iter()
            .chain(backend.all.iter())
            .find(|video| video.id == id)
            .cloned()
            .ok_or_else(|| StudioError::Backend("Video not found".to_string()))
    }

    async fn update_video(&self, _token: &str, id: &str, update: &VideoUpdate) -> StudioResult<()> {
        self.record(ApiCall::Update(id.to_string(), update.clone()));
        match &self.backend.lock().unwrap().fail_update {
            Some(message) => Err(StudioError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    async fn delete_video(&self, _token: &str, id: &str) -> StudioResult<()> {
        self.record(ApiCall::Delete(id.to_string()));
        let mut backend = self.backend.lock().unwrap();
        if let Some(message) = &backend.fail_delete {
            return Err(StudioError::Backend(message.clone()));
        }
        backend.owned.retain(|video| video.id != id);
        backend.all.retain(|video| video.id != id);
        Ok(())
    }

    async fn upload_thumbnail(
        &self,
        _token: &str,
        id: &str,
        _file: &ThumbnailFile,
    ) -> StudioResult<String> {
        self.record(ApiCall::UploadThumbnail(id.to_string()));
        Ok(format!("/uploads/thumbnails/{id}.jpg"))
    }

    async fn health(&self) -> StudioResult<u16> {
        self.record(ApiCall::Health);
        if self.backend.lock().unwrap().offline {
            return Err(StudioError::Backend("connection refused".to_string()));
        }
        Ok(200)
    }

    async fn analytics(&self, _token: &str, report: AnalyticsReport) -> StudioResult<serde_json::Value> {
        self.record(ApiCall::Analytics(report));
        self.backend
            .lock()
            .unwrap()
            .analytics
            .get(report.path())
            .cloned()
            .ok_or(StudioError::UnexpectedStatus {
                status: 404,
                body: String::new(),
            })
    }
}

/// Auth service with a fixed session
pub struct StaticAuth {
    session: Option<SessionData>,
}

impl StaticAuth {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            session: Some(SessionData {
                token: "t0k".to_string(),
                user: SessionUser {
                    id: Some(user_id.to_string()),
                    object_id: None,
                    name: Some("ana".to_string()),
                    avatar: None,
                    picture: None,
                    subscribers: 1200,
                },
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }
}

impl AuthService for StaticAuth {
    async fn get_session_data(&self) -> Option<SessionData> {
        self.session.clone()
    }
}

/// Synchronizer counting its invocations
#[derive(Default)]
pub struct CountingSync {
    runs: AtomicUsize,
    delay: Option<Duration>,
    pub ran: Notify,
}

impl CountingSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each run takes `delay` to complete
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Synchronize for CountingSync {
    async fn synchronize(&self) -> SyncOutcome {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.ran.notify_one();
        SyncOutcome::Empty
    }
}
