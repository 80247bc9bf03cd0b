//! Edit-video workflow
//!
//! One [`EditWorkflow`] owns the single live edit session. Opening a video
//! replaces whatever session was live; results of a superseded open are
//! dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::api::VideoApi;
use crate::auth::AuthService;
use crate::config::ThumbnailDelivery;
use crate::error::{StudioError, StudioResult};
use crate::models::video::{Video, VideoUpdate, Visibility};
use crate::sync::Synchronize;
use crate::thumbnail::{FrameSurface, ThumbnailFile, capture_frame};
use crate::validation::{MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, validate_length};

/// Editable fields of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditForm {
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub category: String,
}

impl EditForm {
    pub fn from_video(video: &Video) -> Self {
        Self {
            title: video.title.clone(),
            description: video.description.clone(),
            visibility: video.visibility(),
            category: video.category().to_string(),
        }
    }

    pub fn validate(&self) -> StudioResult<()> {
        validate_length("Title", &self.title, MAX_TITLE_CHARS)?;
        validate_length("Description", &self.description, MAX_DESCRIPTION_CHARS)?;
        Ok(())
    }

    pub fn title_count(&self) -> CharCount {
        CharCount::of(&self.title, MAX_TITLE_CHARS)
    }

    pub fn description_count(&self) -> CharCount {
        CharCount::of(&self.description, MAX_DESCRIPTION_CHARS)
    }

    /// Update payload carrying the editable fields only
    pub fn to_update(&self, thumbnail_url: Option<String>) -> VideoUpdate {
        VideoUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            visibility: self.visibility,
            category: self.category.clone(),
            thumbnail_url,
        }
    }
}

/// Character counter shown next to a limited field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharCount {
    pub used: usize,
    pub max: usize,
    pub at_limit: bool,
}

impl CharCount {
    fn of(value: &str, max: usize) -> Self {
        let used = value.chars().count();
        Self {
            used,
            max,
            at_limit: used >= max,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub video: Video,
    pub form: EditForm,
    pub pending_thumbnail: Option<ThumbnailFile>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditState {
    #[default]
    Closed,
    Editing(EditSession),
    /// Save in flight; edits stay readable but not mutable
    Saving(EditSession),
}

/// Coarse phase of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPhase {
    Closed,
    Editing,
    Saving,
}

impl EditState {
    pub fn phase(&self) -> EditPhase {
        match self {
            EditState::Closed => EditPhase::Closed,
            EditState::Editing(_) => EditPhase::Editing,
            EditState::Saving(_) => EditPhase::Saving,
        }
    }
}

#[derive(Default)]
struct Slot {
    state: EditState,
    /// Bumped on every open; stale fetches compare against it
    generation: u64,
}

pub struct EditWorkflow<A, U, S> {
    api: Arc<A>,
    auth: Arc<U>,
    sync: Arc<S>,
    delivery: ThumbnailDelivery,
    uploads_base_url: String,
    slot: Mutex<Slot>,
}

impl<A: VideoApi, U: AuthService, S: Synchronize> EditWorkflow<A, U, S> {
    pub fn new(
        api: Arc<A>,
        auth: Arc<U>,
        sync: Arc<S>,
        delivery: ThumbnailDelivery,
        uploads_base_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            auth,
            sync,
            delivery,
            uploads_base_url: uploads_base_url.into(),
            slot: Mutex::new(Slot::default()),
        }
    }

    async fn token(&self) -> StudioResult<String> {
        self.auth
            .get_session_data()
            .await
            .filter(|session| session.is_valid())
            .map(|session| session.token)
            .ok_or(StudioError::Unauthenticated)
    }

    pub async fn state(&self) -> EditState {
        self.slot.lock().await.state.clone()
    }

    pub async fn phase(&self) -> EditPhase {
        self.slot.lock().await.state.phase()
    }

    /// Fetch `id` and start editing it, replacing any live session
    pub async fn open(&self, id: &str) -> StudioResult<EditForm> {
        let generation = {
            let mut slot = self.slot.lock().await;
            slot.state = EditState::Closed;
            slot.generation += 1;
            slot.generation
        };

        info!("Opening video {} for editing", id);
        let token = self.token().await?;
        let video = self
            .api
            .get_video(&token, id)
            .await
            .inspect_err(|e| error!("Error opening video {}: {}", id, e))?;

        let form = EditForm::from_video(&video);
        let mut slot = self.slot.lock().await;
        if slot.generation != generation {
            warn!("Discarding stale edit session for {}", id);
            return Err(StudioError::NoActiveSession);
        }
        slot.state = EditState::Editing(EditSession {
            video,
            form: form.clone(),
            pending_thumbnail: None,
        });
        Ok(form)
    }

    /// Apply local edits to the form; rejected edits leave it unchanged
    pub async fn update_form<F>(&self, edit: F) -> StudioResult<EditForm>
    where
        F: FnOnce(&mut EditForm),
    {
        let mut slot = self.slot.lock().await;
        let EditState::Editing(session) = &mut slot.state else {
            return Err(StudioError::NoActiveSession);
        };

        let mut form = session.form.clone();
        edit(&mut form);
        form.validate()?;
        session.form = form.clone();
        Ok(form)
    }

    /// Stage an uploaded image as the new thumbnail
    pub async fn attach_thumbnail(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> StudioResult<()> {
        let file = ThumbnailFile::from_upload(name, mime_type, bytes)?;
        self.stage_thumbnail(file).await
    }

    /// Stage a frame captured from the preview as the new thumbnail
    pub async fn capture_thumbnail(&self, surface: &impl FrameSurface) -> StudioResult<()> {
        let file = capture_frame(surface)?;
        info!("Captured frame {} ({} bytes)", file.name, file.bytes.len());
        self.stage_thumbnail(file).await
    }

    async fn stage_thumbnail(&self, file: ThumbnailFile) -> StudioResult<()> {
        let mut slot = self.slot.lock().await;
        match &mut slot.state {
            EditState::Editing(session) => {
                session.pending_thumbnail = Some(file);
                Ok(())
            }
            _ => Err(StudioError::NoActiveSession),
        }
    }

    pub async fn remove_thumbnail(&self) -> StudioResult<()> {
        let mut slot = self.slot.lock().await;
        match &mut slot.state {
            EditState::Editing(session) => {
                session.pending_thumbnail = None;
                info!("Pending thumbnail removed");
                Ok(())
            }
            _ => Err(StudioError::NoActiveSession),
        }
    }

    /// Absolute URL of the video file to grab frames from
    pub async fn capture_source_url(&self) -> StudioResult<String> {
        let slot = self.slot.lock().await;
        let EditState::Editing(session) = &slot.state else {
            return Err(StudioError::NoActiveSession);
        };

        let source = session.video.source_url().ok_or_else(|| {
            StudioError::NotFound("Video file not found. Please upload a video first.".to_string())
        })?;
        if source.starts_with("http") {
            return Ok(source.to_string());
        }
        Ok(format!(
            "{}/{}",
            self.uploads_base_url.trim_end_matches('/'),
            source.trim_start_matches('/')
        ))
    }

    /// Close the session without sending anything
    pub async fn cancel(&self) {
        let mut slot = self.slot.lock().await;
        slot.state = EditState::Closed;
        slot.generation += 1;
    }

    /// Send the edits as one update.
    ///
    /// On success the session closes and the video list is synchronized
    /// again; on failure the session returns to editing with edits intact.
    pub async fn save(&self) -> StudioResult<()> {
        let (session, generation) = {
            let mut slot = self.slot.lock().await;
            let session = match std::mem::take(&mut slot.state) {
                EditState::Editing(session) => session,
                other => {
                    slot.state = other;
                    return Err(StudioError::NoActiveSession);
                }
            };
            slot.state = EditState::Saving(session.clone());
            (session, slot.generation)
        };

        info!("Saving edits for video {}", session.video.id);
        match self.send(&session).await {
            Ok(()) => {
                {
                    let mut slot = self.slot.lock().await;
                    if slot.generation == generation {
                        slot.state = EditState::Closed;
                    }
                }
                info!("Video {} updated", session.video.id);
                self.sync.synchronize().await;
                Ok(())
            }
            Err(e) => {
                error!("Error saving video {}: {}", session.video.id, e);
                let mut slot = self.slot.lock().await;
                if slot.generation == generation {
                    slot.state = EditState::Editing(session);
                }
                Err(e)
            }
        }
    }

    async fn send(&self, session: &EditSession) -> StudioResult<()> {
        let token = self.token().await?;
        let id = &session.video.id;

        let thumbnail_url = match (&session.pending_thumbnail, self.delivery) {
            (None, _) => None,
            (Some(file), ThumbnailDelivery::Upload) => {
                Some(self.api.upload_thumbnail(&token, id, file).await?)
            }
            (Some(file), ThumbnailDelivery::Inline) => Some(file.to_data_uri()),
        };

        self.api
            .update_video(&token, id, &session.form.to_update(thumbnail_url))
            .await
    }
}
