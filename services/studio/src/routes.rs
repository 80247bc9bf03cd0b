//! Studio service routes

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Local, Utc};
use common::signal::StudioSignal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    analytics,
    api::VideoApi,
    edit::{EditForm, EditState},
    error::{StudioError, StudioResult},
    models::video::Visibility,
    refresh::RefreshTrigger,
    render::SurfaceId,
    repositories::{
        ab_tests::Variant, collaborators::CollaboratorRole, library::NewAsset,
        scheduled::optimal_upload_times,
    },
    state::AppState,
    sync::Synchronize,
    thumbnail::RgbaFrame,
};

/// Upper bound on edit request bodies; large enough for a raw 1080p PNG
/// frame so oversized thumbnails still reach validation
pub const MAX_EDIT_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Create the router for the studio service
pub fn create_router<A: VideoApi + 'static>(state: AppState<A>) -> Router {
    let edit_routes = Router::new()
        .route("/", get(edit_state::<A>).patch(update_form::<A>))
        .route("/save", post(save_edit::<A>))
        .route("/cancel", post(cancel_edit::<A>))
        .route(
            "/thumbnail",
            post(attach_thumbnail::<A>).delete(remove_thumbnail::<A>),
        )
        .route("/capture", post(capture_frame::<A>))
        .route("/capture-source", get(capture_source::<A>))
        .layer(DefaultBodyLimit::max(MAX_EDIT_BODY_BYTES));

    let tool_routes = Router::new()
        .route("/schedule", get(scheduled_videos::<A>).post(schedule_video::<A>))
        .route("/schedule/optimal", get(optimal_times))
        .route("/schedule/:video_id", delete(cancel_schedule::<A>))
        .route("/collaborators", get(collaborators::<A>))
        .route(
            "/collaborators/:id/permissions",
            put(update_permissions::<A>),
        )
        .route("/invitations", get(invitations::<A>).post(invite::<A>))
        .route("/invitations/:id/accept", post(accept_invitation::<A>))
        .route("/library/assets", get(assets::<A>).post(add_asset::<A>))
        .route("/library/assets/:id", delete(delete_asset::<A>))
        .route("/library/folders", get(folders::<A>).post(create_folder::<A>))
        .route("/ab-tests", get(ab_tests::<A>).post(create_ab_test::<A>))
        .route("/ab-tests/:id/winner", post(select_winner::<A>));

    Router::new()
        .route("/health", get(health_check))
        .route("/studio/dashboard", get(dashboard::<A>))
        .route("/studio/content", get(content::<A>))
        .route("/studio/analytics", get(analytics_view::<A>))
        .route("/studio/metrics", get(metrics::<A>))
        .route("/studio/pathways", get(pathways::<A>).post(run_pathways::<A>))
        .route("/studio/pathways/summary", get(pathway_summary::<A>))
        .route("/studio/pathways/export", get(export_pathways::<A>))
        .route("/studio/signals", post(publish_signal::<A>))
        .route("/studio/focus", post(focus::<A>))
        .route("/studio/sync", post(synchronize::<A>))
        .route("/studio/videos/:id", delete(delete_video::<A>))
        .route("/studio/videos/:id/edit", post(open_edit::<A>))
        .nest("/studio/edit", edit_routes)
        .nest("/studio/tools", tool_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "studio-service"
    }))
}

/// Dashboard metrics and recent videos
pub async fn dashboard<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    Json(json!({
        "metrics": state.surfaces.metrics().await,
        "preview": state.surfaces.get(SurfaceId::DashboardPreview).await,
    }))
}

/// Full content management table
pub async fn content<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    Html(state.surfaces.get(SurfaceId::ContentTable).await)
}

/// Analytics lists and backend reports
pub async fn analytics_view<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    let revenue = state.analytics.revenue_breakdown().await;
    let realtime = state.analytics.realtime_metrics().await;
    let audience = state.analytics.audience_insights().await;
    let total_views = state
        .surfaces
        .metrics()
        .await
        .map(|metrics| metrics.total_views)
        .unwrap_or(0);

    Json(json!({
        "topContent": state.surfaces.get(SurfaceId::TopContent).await,
        "realtimeContent": state.surfaces.get(SurfaceId::RealtimeContent).await,
        "popularVideos": state.surfaces.get(SurfaceId::PopularVideos).await,
        "cpm": analytics::cpm(total_views, revenue.total),
        "audience": audience,
        "revenue": revenue,
        "realtime": realtime,
    }))
}

pub async fn metrics<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    Json(state.surfaces.metrics().await)
}

/// Latest pathway report
pub async fn pathways<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> Result<impl IntoResponse, StudioError> {
    let report = state
        .monitor
        .report()
        .await
        .ok_or_else(|| StudioError::NotFound("No pathway report yet".to_string()))?;
    Ok(Json(report))
}

/// Run the diagnostics now
pub async fn run_pathways<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    Json(state.monitor.run().await)
}

pub async fn pathway_summary<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> Result<impl IntoResponse, StudioError> {
    let summary = state
        .monitor
        .summary()
        .await
        .ok_or_else(|| StudioError::NotFound("No pathway report yet".to_string()))?;
    Ok(Json(summary))
}

/// Latest pathway report as a JSON download
pub async fn export_pathways<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> Result<impl IntoResponse, StudioError> {
    let body = state.monitor.export_json().await?;
    let disposition = format!(
        "attachment; filename=\"pathway-report-{}.json\"",
        Utc::now().timestamp_millis()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    pub signal: StudioSignal,
}

/// Relay a change signal from another studio instance
pub async fn publish_signal<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(payload): Json<SignalRequest>,
) -> impl IntoResponse {
    let delivered = state.bus.publish_from(Uuid::new_v4(), payload.signal);
    (StatusCode::ACCEPTED, Json(json!({ "delivered": delivered })))
}

/// The studio regained focus
pub async fn focus<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    let refreshed = state.refresh.trigger(RefreshTrigger::Focus).await;
    Json(json!({ "refreshed": refreshed }))
}

/// Synchronize immediately, bypassing the refresh cooldown
pub async fn synchronize<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    Json(state.synchronizer.synchronize().await)
}

pub async fn delete_video<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StudioError> {
    state.content.delete_video(&id).await?;
    Ok(Json(json!({"message": "Video deleted successfully"})))
}

fn form_view(form: &EditForm) -> serde_json::Value {
    json!({
        "form": form,
        "titleCount": form.title_count(),
        "descriptionCount": form.description_count(),
    })
}

pub async fn open_edit<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StudioError> {
    let form = state.edit.open(&id).await?;
    Ok(Json(form_view(&form)))
}

/// Current edit session
pub async fn edit_state<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    let edit_state = state.edit.state().await;
    let phase = edit_state.phase();
    match edit_state {
        EditState::Closed => Json(json!({ "phase": phase })),
        EditState::Editing(session) | EditState::Saving(session) => {
            let mut view = form_view(&session.form);
            view["phase"] = json!(phase);
            view["videoId"] = json!(session.video.id);
            view["pendingThumbnail"] = json!(session.pending_thumbnail.is_some());
            Json(view)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FormPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub category: Option<String>,
}

pub async fn update_form<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(patch): Json<FormPatch>,
) -> Result<impl IntoResponse, StudioError> {
    let form = state
        .edit
        .update_form(move |form| {
            if let Some(title) = patch.title {
                form.title = title;
            }
            if let Some(description) = patch.description {
                form.description = description;
            }
            if let Some(visibility) = patch.visibility {
                form.visibility = visibility;
            }
            if let Some(category) = patch.category {
                form.category = category;
            }
        })
        .await?;
    Ok(Json(form_view(&form)))
}

pub async fn save_edit<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> Result<impl IntoResponse, StudioError> {
    state.edit.save().await?;
    Ok(Json(json!({"message": "Video updated successfully"})))
}

pub async fn cancel_edit<A: VideoApi>(State(state): State<AppState<A>>) -> impl IntoResponse {
    state.edit.cancel().await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub name: Option<String>,
}

/// Stage the request body as the new thumbnail; the image type comes from `Content-Type`
pub async fn attach_thumbnail<A: VideoApi>(
    State(state): State<AppState<A>>,
    Query(query): Query<ThumbnailQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, StudioError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");
    let name = query.name.unwrap_or_else(|| "thumbnail".to_string());

    state
        .edit
        .attach_thumbnail(&name, mime_type, body.to_vec())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_thumbnail<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> Result<impl IntoResponse, StudioError> {
    state.edit.remove_thumbnail().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CaptureQuery {
    /// False when the frame was read from a video served by another origin
    #[serde(default = "default_true")]
    pub same_origin: bool,
}

fn default_true() -> bool {
    true
}

/// Capture a still of the preview (PNG or JPEG body) as the new thumbnail
pub async fn capture_frame<A: VideoApi>(
    State(state): State<AppState<A>>,
    Query(query): Query<CaptureQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, StudioError> {
    let frame = RgbaFrame::decode(&body, query.same_origin)?;
    state.edit.capture_thumbnail(&frame).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn capture_source<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> Result<impl IntoResponse, StudioError> {
    let url = state.edit.capture_source_url().await?;
    Ok(Json(json!({ "url": url })))
}

pub async fn scheduled_videos<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.scheduler.scheduled_videos().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub video_id: String,
    pub publish_date: DateTime<Utc>,
}

pub async fn schedule_video<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(payload): Json<ScheduleRequest>,
) -> StudioResult<impl IntoResponse> {
    let scheduled = state
        .scheduler
        .schedule_video(&payload.video_id, payload.publish_date)
        .await?;
    Ok((StatusCode::CREATED, Json(scheduled)))
}

pub async fn optimal_times() -> impl IntoResponse {
    Json(optimal_upload_times(Local::now().date_naive()))
}

pub async fn cancel_schedule<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(video_id): Path<String>,
) -> StudioResult<impl IntoResponse> {
    if state.scheduler.cancel_schedule(&video_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StudioError::NotFound(format!("schedule for video {}", video_id)))
    }
}

pub async fn collaborators<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.collaboration.collaborators().await?))
}

pub async fn invitations<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.collaboration.invitations().await?))
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    pub role: CollaboratorRole,
    #[serde(default)]
    pub permissions: Vec<String>,
}

pub async fn invite<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(payload): Json<InviteRequest>,
) -> StudioResult<impl IntoResponse> {
    let invitation = state
        .collaboration
        .invite(&payload.email, payload.role, payload.permissions)
        .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn accept_invitation<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<i64>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.collaboration.accept_invitation(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub permissions: Vec<String>,
}

pub async fn update_permissions<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<i64>,
    Json(payload): Json<PermissionsRequest>,
) -> StudioResult<impl IntoResponse> {
    if state
        .collaboration
        .update_permissions(id, payload.permissions)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StudioError::NotFound(format!("collaborator {}", id)))
    }
}

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub folder: Option<String>,
}

pub async fn assets<A: VideoApi>(
    State(state): State<AppState<A>>,
    Query(query): Query<FolderQuery>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.library.assets(query.folder.as_deref()).await?))
}

pub async fn add_asset<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(payload): Json<NewAsset>,
) -> StudioResult<impl IntoResponse> {
    let asset = state.library.add_asset(payload).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn delete_asset<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<i64>,
) -> StudioResult<impl IntoResponse> {
    if state.library.delete_asset(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StudioError::NotFound(format!("asset {}", id)))
    }
}

pub async fn folders<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.library.folders().await?))
}

#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    pub name: String,
    pub parent: Option<i64>,
}

pub async fn create_folder<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(payload): Json<FolderRequest>,
) -> StudioResult<impl IntoResponse> {
    let folder = state
        .library
        .create_folder(&payload.name, payload.parent)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn ab_tests<A: VideoApi>(
    State(state): State<AppState<A>>,
) -> StudioResult<impl IntoResponse> {
    Ok(Json(state.ab_tests.tests().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTestRequest {
    pub video_id: String,
    pub variants: Vec<Variant>,
}

pub async fn create_ab_test<A: VideoApi>(
    State(state): State<AppState<A>>,
    Json(payload): Json<AbTestRequest>,
) -> StudioResult<impl IntoResponse> {
    let test = state
        .ab_tests
        .create_test(&payload.video_id, payload.variants)
        .await?;
    Ok((StatusCode::CREATED, Json(test)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRequest {
    pub variant_index: usize,
}

pub async fn select_winner<A: VideoApi>(
    State(state): State<AppState<A>>,
    Path(id): Path<i64>,
    Json(payload): Json<WinnerRequest>,
) -> StudioResult<impl IntoResponse> {
    if state.ab_tests.select_winner(id, payload.variant_index).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StudioError::NotFound(format!("A/B test {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudioConfig;
    use crate::testing::{FakeVideoApi, video};
    use common::signal::SignalBus;
    use common::store::{KeyValueStore, MemoryStore, Store};
    use serde_json::Value;
    use std::sync::Arc;

    async fn spawn_studio(api: FakeVideoApi, signed_in: bool) -> (String, AppState<FakeVideoApi>) {
        let store = MemoryStore::new();
        if signed_in {
            store
                .set(
                    "bhuban_session",
                    r#"{"token":"t0k","user":{"_id":"u1","name":"ana","subscribers":3}}"#,
                )
                .await
                .unwrap();
        }
        let state = AppState::new(
            StudioConfig::default(),
            Arc::new(api),
            Store::Memory(store),
            SignalBus::default(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), state)
    }

    #[tokio::test]
    async fn test_health() {
        let (base, _) = spawn_studio(FakeVideoApi::new(), false).await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_sync_then_serve_content() {
        let api = FakeVideoApi::with_videos(vec![video("v1", 10), video("v2", 20)], Vec::new());
        let (base, _) = spawn_studio(api, true).await;
        let client = reqwest::Client::new();

        let outcome: Value = client
            .post(format!("{base}/studio/sync"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(outcome["outcome"], "rendered");
        assert_eq!(outcome["count"], 2);

        let table = client
            .get(format!("{base}/studio/content"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(table.contains(r#"data-video-id="v2""#));

        let metrics: Value = client
            .get(format!("{base}/studio/metrics"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(metrics["viewCount"], "30");
        assert_eq!(metrics["subCount"], "3");
    }

    #[tokio::test]
    async fn test_signed_out_sync_asks_for_login() {
        let (base, _) = spawn_studio(FakeVideoApi::new(), false).await;
        let outcome: Value = reqwest::Client::new()
            .post(format!("{base}/studio/sync"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(outcome["outcome"], "login_required");
        assert_eq!(
            outcome["redirect"],
            "/login.html?redirect=%2Fcreator%2Dstudio%2Ehtml"
        );
    }

    #[tokio::test]
    async fn test_edit_flow_over_http() {
        let api = FakeVideoApi::with_videos(vec![video("v1", 10)], Vec::new());
        let (base, state) = spawn_studio(api, true).await;
        let client = reqwest::Client::new();

        let opened: Value = client
            .post(format!("{base}/studio/videos/v1/edit"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(opened["form"]["title"], "Video v1");

        let response = client
            .patch(format!("{base}/studio/edit"))
            .json(&json!({"title": "x".repeat(101)}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = client
            .post(format!("{base}/studio/edit/thumbnail?name=doc.pdf"))
            .header("content-type", "application/pdf")
            .body(vec![0u8; 16])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = client
            .post(format!("{base}/studio/edit/save"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let phase: Value = client
            .get(format!("{base}/studio/edit"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(phase["phase"], "closed");
        assert_eq!(state.edit.phase().await, crate::edit::EditPhase::Closed);
    }

    /// 1080p PNG of pseudo-random noise, which does not compress below 2 MiB
    fn noisy_frame_png() -> Vec<u8> {
        let mut seed: u32 = 0x9e37_79b9;
        let pixels = (0..1920 * 1080 * 4)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                (seed >> 24) as u8
            })
            .collect();
        let frame = image::RgbaImage::from_raw(1920, 1080, pixels).unwrap();

        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(frame)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        png.into_inner()
    }

    #[tokio::test]
    async fn test_oversized_thumbnail_gets_size_error() {
        let api = FakeVideoApi::with_videos(vec![video("v1", 10)], Vec::new());
        let (base, state) = spawn_studio(api, true).await;
        let client = reqwest::Client::new();
        client
            .post(format!("{base}/studio/videos/v1/edit"))
            .send()
            .await
            .unwrap();

        let response = client
            .post(format!("{base}/studio/edit/thumbnail?name=big.png"))
            .header("content-type", "image/png")
            .body(vec![0u8; 3 * 1024 * 1024])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Image size must be less than 2MB")
        );

        let EditState::Editing(session) = state.edit.state().await else {
            panic!("edit session should stay open");
        };
        assert!(session.pending_thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_large_frame_capture_is_accepted() {
        let api = FakeVideoApi::with_videos(vec![video("v1", 10)], Vec::new());
        let (base, _) = spawn_studio(api, true).await;
        let client = reqwest::Client::new();
        client
            .post(format!("{base}/studio/videos/v1/edit"))
            .send()
            .await
            .unwrap();

        let png = noisy_frame_png();
        assert!(png.len() > 2 * 1024 * 1024);
        let response = client
            .post(format!("{base}/studio/edit/capture"))
            .header("content-type", "image/png")
            .body(png)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let edit: Value = client
            .get(format!("{base}/studio/edit"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(edit["pendingThumbnail"], true);
    }

    #[tokio::test]
    async fn test_relayed_signal_reaches_subscribers() {
        let (base, state) = spawn_studio(FakeVideoApi::new(), true).await;
        let mut signals = state.bus.subscribe();

        let response = reqwest::Client::new()
            .post(format!("{base}/studio/signals"))
            .json(&json!({"signal": "videoUploaded"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let envelope = signals.recv().await.unwrap();
        assert_eq!(envelope.signal, StudioSignal::VideoUploaded);
        assert_ne!(envelope.origin, state.bus.instance_id());
    }

    #[tokio::test]
    async fn test_schedule_round_trip_over_http() {
        let (base, _) = spawn_studio(FakeVideoApi::new(), true).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/studio/tools/schedule"))
            .json(&json!({"videoId": "v1", "publishDate": "2026-11-02T18:00:00Z"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let scheduled: Value = client
            .get(format!("{base}/studio/tools/schedule"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(scheduled[0]["videoId"], "v1");
        assert_eq!(scheduled[0]["status"], "scheduled");

        let response = client
            .delete(format!("{base}/studio/tools/schedule/unknown"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pathways_before_and_after_run() {
        let (base, _) = spawn_studio(FakeVideoApi::new(), true).await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{base}/studio/pathways"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        client
            .post(format!("{base}/studio/pathways"))
            .send()
            .await
            .unwrap();
        let summary: Value = client
            .get(format!("{base}/studio/pathways/summary"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(summary["message"], "All systems operational");
    }
}
