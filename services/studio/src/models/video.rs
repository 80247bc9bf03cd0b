//! Video models for the studio service

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Video record as returned by the backend.
///
/// `id`, `views`, `likes` and `comments` are projections of backend state
/// and are never sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVideo")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub visibility: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    pub url: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "isShort")]
    pub is_short: bool,
}

/// Wire shape of a video; the backend sends `_id`, `id`, or both
#[derive(Deserialize)]
struct RawVideo {
    #[serde(rename = "_id", default)]
    object_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(rename = "thumbnailUrl", default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(rename = "videoUrl", default)]
    video_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    views: Option<u64>,
    #[serde(default)]
    likes: Option<u64>,
    #[serde(default)]
    comments: Option<u64>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "isShort", default)]
    is_short: Option<bool>,
}

impl TryFrom<RawVideo> for Video {
    type Error = String;

    fn try_from(raw: RawVideo) -> Result<Self, Self::Error> {
        let id = raw
            .object_id
            .or(raw.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "video without an id".to_string())?;

        Ok(Video {
            id,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            visibility: raw.visibility,
            status: raw.status,
            category: raw.category,
            thumbnail_url: raw.thumbnail_url,
            thumbnail: raw.thumbnail,
            video_url: raw.video_url,
            url: raw.url,
            views: raw.views.unwrap_or(0),
            likes: raw.likes.unwrap_or(0),
            comments: raw.comments.unwrap_or(0),
            created_at: raw.created_at,
            is_short: raw.is_short.unwrap_or(false),
        })
    }
}

/// Treat the stringified JS sentinels the backend sometimes stores as absent
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty() && *v != "null" && *v != "undefined")
}

impl Video {
    /// Effective visibility, preferring `visibility` over the legacy `status`
    pub fn visibility(&self) -> Visibility {
        present(&self.visibility)
            .or(present(&self.status))
            .and_then(Visibility::parse)
            .unwrap_or_default()
    }

    /// Category tag, `other` when unset
    pub fn category(&self) -> &str {
        present(&self.category).unwrap_or("other")
    }

    /// Status label shown in the content table
    pub fn status_label(&self) -> &str {
        present(&self.status)
            .or(present(&self.visibility))
            .unwrap_or("public")
    }

    /// Thumbnail reference, if any
    pub fn thumbnail(&self) -> Option<&str> {
        present(&self.thumbnail_url).or(present(&self.thumbnail))
    }

    /// Video file reference, if any
    pub fn source_url(&self) -> Option<&str> {
        present(&self.video_url).or(present(&self.url))
    }
}

/// Visibility of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "unlisted" => Some(Visibility::Unlisted),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        };
        f.write_str(name)
    }
}

/// Update payload for `PATCH /videos/<id>`; carries editable fields only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoUpdate {
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub category: String,
    #[serde(rename = "thumbnailUrl", skip_serializing_if = "Option::is_none", default)]
    pub thumbnail_url: Option<String>,
}

/// Payload returned by the thumbnail upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailUploaded {
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}
