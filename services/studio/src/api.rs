//! Client for the backend REST API

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, multipart};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StudioError, StudioResult};
use crate::models::ApiEnvelope;
use crate::models::video::{ThumbnailUploaded, Video, VideoUpdate};
use crate::thumbnail::ThumbnailFile;

/// Creator analytics reports served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsReport {
    Audience,
    Revenue,
    Realtime,
}

impl AnalyticsReport {
    pub fn path(&self) -> &'static str {
        match self {
            AnalyticsReport::Audience => "audience",
            AnalyticsReport::Revenue => "revenue",
            AnalyticsReport::Realtime => "realtime",
        }
    }
}

impl fmt::Display for AnalyticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Operations the studio performs against the video backend.
///
/// Every call carries the session token; an empty token sends no
/// `Authorization` header.
pub trait VideoApi: Send + Sync {
    /// `GET /videos`, filtered by owner when `user_id` is given
    fn list_videos(
        &self,
        token: &str,
        user_id: Option<&str>,
    ) -> impl Future<Output = StudioResult<ApiEnvelope<Vec<Video>>>> + Send;

    /// `GET /videos/<id>`
    fn get_video(&self, token: &str, id: &str) -> impl Future<Output = StudioResult<Video>> + Send;

    /// `PATCH /videos/<id>`
    fn update_video(
        &self,
        token: &str,
        id: &str,
        update: &VideoUpdate,
    ) -> impl Future<Output = StudioResult<()>> + Send;

    /// `DELETE /videos/<id>`
    fn delete_video(&self, token: &str, id: &str) -> impl Future<Output = StudioResult<()>> + Send;

    /// `POST /videos/<id>/thumbnail`, returning the stored thumbnail URL
    fn upload_thumbnail(
        &self,
        token: &str,
        id: &str,
        file: &ThumbnailFile,
    ) -> impl Future<Output = StudioResult<String>> + Send;

    /// `GET /health`, returning the HTTP status code
    fn health(&self) -> impl Future<Output = StudioResult<u16>> + Send;

    /// `GET /creator-analytics/<report>`
    fn analytics(
        &self,
        token: &str,
        report: AnalyticsReport,
    ) -> impl Future<Output = StudioResult<serde_json::Value>> + Send;
}

/// Async HTTP client for the backend
#[derive(Debug, Clone)]
pub struct HttpVideoApi {
    base_url: String,
    http: Client,
}

impl HttpVideoApi {
    /// Create a new client targeting the provided base URL
    pub fn new(base_url: impl Into<String>) -> StudioResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Returns the base URL configured for this client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.base_url)
    }

    fn video_url(&self, id: &str) -> String {
        format!("{}/videos/{}", self.base_url, id)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        if token.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, format!("Bearer {}", token))
        }
    }

    /// Decode the envelope of a response, mapping error statuses
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> StudioResult<ApiEnvelope<T>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        // Error responses usually still carry the envelope with a message
        match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body) {
            Ok(ApiEnvelope {
                message: Some(message),
                ..
            }) => Err(StudioError::Backend(message)),
            _ => Err(StudioError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

impl VideoApi for HttpVideoApi {
    async fn list_videos(
        &self,
        token: &str,
        user_id: Option<&str>,
    ) -> StudioResult<ApiEnvelope<Vec<Video>>> {
        let mut request = self.http.get(self.videos_url());
        if let Some(user_id) = user_id {
            request = request.query(&[("user", user_id)]);
        }
        debug!("Fetching videos (user filter: {:?})", user_id);

        let response = self.authorized(request, token).send().await?;
        Self::read_envelope(response).await
    }

    async fn get_video(&self, token: &str, id: &str) -> StudioResult<Video> {
        let request = self.http.get(self.video_url(id));
        let response = self.authorized(request, token).send().await?;
        Self::read_envelope(response)
            .await?
            .into_result("Video not found or invalid data")
    }

    async fn update_video(&self, token: &str, id: &str, update: &VideoUpdate) -> StudioResult<()> {
        let request = self.http.patch(self.video_url(id)).json(update);
        let response = self.authorized(request, token).send().await?;
        let envelope: ApiEnvelope<serde_json::Value> = Self::read_envelope(response).await?;

        if envelope.success {
            Ok(())
        } else {
            Err(StudioError::Backend(
                envelope
                    .message
                    .unwrap_or_else(|| "Failed to update video".to_string()),
            ))
        }
    }

    async fn delete_video(&self, token: &str, id: &str) -> StudioResult<()> {
        let request = self.http.delete(self.video_url(id));
        let response = self.authorized(request, token).send().await?;
        let envelope: ApiEnvelope<serde_json::Value> = Self::read_envelope(response).await?;

        if envelope.success {
            Ok(())
        } else {
            Err(StudioError::Backend(
                envelope.message.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }

    async fn upload_thumbnail(
        &self,
        token: &str,
        id: &str,
        file: &ThumbnailFile,
    ) -> StudioResult<String> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = multipart::Form::new().part("thumbnail", part);

        let url = format!("{}/thumbnail", self.video_url(id));
        let request = self.http.post(url).multipart(form);
        let response = self.authorized(request, token).send().await?;

        let uploaded: ThumbnailUploaded = Self::read_envelope(response)
            .await?
            .into_result("Thumbnail upload failed")?;
        Ok(uploaded.thumbnail_url)
    }

    async fn health(&self) -> StudioResult<u16> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn analytics(&self, token: &str, report: AnalyticsReport) -> StudioResult<serde_json::Value> {
        let url = format!("{}/creator-analytics/{}", self.base_url, report.path());
        let request = self.http.get(url);
        let response = self.authorized(request, token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}
