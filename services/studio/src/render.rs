//! HTML rendering of the studio surfaces
//!
//! Each surface is a named HTML fragment that is replaced as a whole on
//! every render.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::analytics;
use crate::models::video::Video;

/// Offline placeholder shown when a video has no thumbnail
pub const FALLBACK_THUMBNAIL: &str = "data:image/svg+xml,%3Csvg xmlns=%22http://www.w3.org/2000/svg%22 width=%22120%22 height=%2268%22%3E%3Crect fill=%22%23222%22 width=%22120%22 height=%2268%22/%3E%3Ctext x=%2250%25%22 y=%2250%25%22 dominant-baseline=%22middle%22 text-anchor=%22middle%22 fill=%22%23666%22 font-size=%2212%22%3ENo Thumbnail%3C/text%3E%3C/svg%3E";

const IMAGE_PROXY: &str = "https://images.weserv.nl/";

/// Number of videos shown in the dashboard preview
pub const DASHBOARD_PREVIEW_LEN: usize = 5;

/// Named fragments the synchronizer renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceId {
    /// Full management table on the content page
    ContentTable,
    /// Recent videos on the dashboard
    DashboardPreview,
    TopContent,
    RealtimeContent,
    PopularVideos,
}

/// Aggregates shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub view_count: String,
    pub like_count: String,
    pub sub_count: String,
    pub video_count: usize,
    pub revenue_amount: String,
    /// Unformatted view total backing `view_count`
    #[serde(skip)]
    pub total_views: u64,
}

#[derive(Debug, Default)]
struct RenderedViews {
    fragments: HashMap<SurfaceId, String>,
    metrics: Option<DashboardMetrics>,
}

/// Shared store of rendered fragments
#[derive(Debug, Clone, Default)]
pub struct Surfaces {
    inner: Arc<RwLock<RenderedViews>>,
}

impl Surfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content of a surface
    pub async fn replace(&self, id: SurfaceId, html: String) {
        self.inner.write().await.fragments.insert(id, html);
    }

    /// Current content of a surface; empty when never rendered
    pub async fn get(&self, id: SurfaceId) -> String {
        self.inner
            .read()
            .await
            .fragments
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set_metrics(&self, metrics: DashboardMetrics) {
        self.inner.write().await.metrics = Some(metrics);
    }

    pub async fn metrics(&self) -> Option<DashboardMetrics> {
        self.inner.read().await.metrics.clone()
    }
}

/// Escape text for use inside HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Route photo hosts known to rate-limit hotlinking through the image proxy
pub fn safe_photo_url(url: &str) -> Option<String> {
    if url.is_empty() || url == "null" || url == "undefined" {
        return None;
    }

    if url.contains("googleusercontent.com")
        || url.contains("lh3.google.com")
        || url.contains("focus-opensocial")
    {
        return Some(format!(
            "{}?url={}&default=letter&l=9&af",
            IMAGE_PROXY,
            utf8_percent_encode(url, NON_ALPHANUMERIC)
        ));
    }

    Some(url.to_string())
}

/// Sized thumbnail for the analytics lists; any remote image goes through the proxy
pub fn proxied_thumbnail(video: &Video, width: u32, height: u32) -> String {
    match video.thumbnail() {
        None => FALLBACK_THUMBNAIL.to_string(),
        Some(url) if url.starts_with("http") => format!(
            "{}?url={}&w={}&h={}&fit=cover&output=webp",
            IMAGE_PROXY,
            utf8_percent_encode(url, NON_ALPHANUMERIC),
            width,
            height
        ),
        Some(url) => url.to_string(),
    }
}

fn thumbnail_src(video: &Video) -> String {
    video
        .thumbnail()
        .and_then(safe_photo_url)
        .unwrap_or_else(|| FALLBACK_THUMBNAIL.to_string())
}

/// Group digits by thousands, e.g. `12,345`
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_date(video: &Video) -> String {
    video
        .created_at
        .map(|date| date.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn loading() -> String {
    r#"<div class="list-placeholder"><i class="fas fa-spinner fa-spin"></i> Loading videos...</div>"#
        .to_string()
}

pub fn error_message(message: &str) -> String {
    format!(
        r#"<div class="list-error"><i class="fas fa-exclamation-triangle"></i> Error loading videos: {}</div>"#,
        escape(message)
    )
}

/// Empty state with an upload call-to-action
pub fn empty_state(upload_page: &str) -> String {
    format!(
        r#"<div class="empty-state"><i class="fas fa-video"></i><h3>No videos yet</h3><p>Upload your first video to get started.</p><a class="btn-primary" href="{}"><i class="fas fa-upload"></i> Upload Video</a></div>"#,
        escape(upload_page)
    )
}

/// One row of the management table, with edit and delete actions
pub fn table_row(video: &Video) -> String {
    let id = escape(&video.id);
    let title = escape(&video.title);
    format!(
        r#"<div class="video-row" data-video-id="{id}"><div class="video-cell"><img src="{thumb}" alt="" crossorigin="anonymous" onerror="this.onerror=null;this.src='{fallback}'"><div class="video-title">{title}</div></div><span class="video-status">{status}</span><div>{date}</div><div>{views}</div><div>{comments}</div><div class="video-actions"><button data-action="edit" data-video-id="{id}" title="Edit video"><i class="fas fa-edit"></i></button><button data-action="delete" data-video-id="{id}" data-video-title="{title}" title="Delete video"><i class="fas fa-trash"></i></button></div></div>"#,
        thumb = escape(&thumbnail_src(video)),
        fallback = FALLBACK_THUMBNAIL,
        status = escape(video.status_label()),
        date = format_date(video),
        views = format_count(video.views),
        comments = format_count(video.comments),
    )
}

pub fn content_table(videos: &[Video]) -> String {
    videos.iter().map(table_row).collect()
}

/// First [`DASHBOARD_PREVIEW_LEN`] videos of the snapshot, shorts drawn portrait
pub fn dashboard_preview(videos: &[Video]) -> String {
    videos
        .iter()
        .take(DASHBOARD_PREVIEW_LEN)
        .map(|video| {
            let (width, height) = if video.is_short { (45, 80) } else { (80, 45) };
            format!(
                r#"<div class="video-row" data-video-id="{id}"><img src="{thumb}" width="{width}" height="{height}" alt=""><div class="video-title">{title}</div><div>{views} views</div><div>$0.00</div></div>"#,
                id = escape(&video.id),
                thumb = escape(&thumbnail_src(video)),
                title = escape(&video.title),
                views = format_count(video.views),
            )
        })
        .collect()
}

fn untitled(video: &Video) -> String {
    if video.title.is_empty() {
        "Untitled".to_string()
    } else {
        escape(&video.title)
    }
}

/// Top content ranking: five most viewed
pub fn top_content(ranked: &[&Video]) -> String {
    let mut out = String::new();
    for video in ranked.iter().take(5) {
        let _ = write!(
            out,
            r#"<div class="popular-video-item" data-video-id="{}"><img src="{}" class="pop-video-thumb"><div class="pop-video-title">{}</div><div class="pop-video-stats">{} views &middot; engagement {}</div></div>"#,
            escape(&video.id),
            escape(&proxied_thumbnail(video, 100, 60)),
            untitled(video),
            format_count(video.views),
            analytics::engagement_score(video),
        );
    }
    out
}

/// Realtime list: three most viewed
pub fn realtime_content(ranked: &[&Video]) -> String {
    let mut out = String::new();
    for video in ranked.iter().take(3) {
        let _ = write!(
            out,
            r#"<div class="realtime-content-item" data-video-id="{}"><img src="{}" class="realtime-thumb"><div class="realtime-title">{}</div><div class="realtime-count">{} views</div></div>"#,
            escape(&video.id),
            escape(&proxied_thumbnail(video, 50, 30)),
            untitled(video),
            format_count(video.views),
        );
    }
    out
}

/// Popular list: five most viewed with a bar relative to the top video
pub fn popular_videos(ranked: &[&Video]) -> String {
    let max_views = ranked.first().map(|video| video.views).unwrap_or(0);
    let mut out = String::new();
    for video in ranked.iter().take(5) {
        let _ = write!(
            out,
            r#"<div class="popular-item" data-video-id="{}"><div class="popular-title">{}</div><div class="popular-bar" style="width: {}%"></div><div class="popular-count">{}</div></div>"#,
            escape(&video.id),
            untitled(video),
            analytics::share_of_max(video.views, max_views),
            format_count(video.views),
        );
    }
    out
}

pub fn no_analytics_data() -> String {
    r#"<div class="list-placeholder">No videos yet</div>"#.to_string()
}
