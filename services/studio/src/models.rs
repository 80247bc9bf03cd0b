//! Models for backend payloads and session data

use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult};

pub mod video;

/// Envelope every backend response is wrapped in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Unwrap the payload, turning `success: false` or a missing payload into an error
    pub fn into_result(self, context: &str) -> StudioResult<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(StudioError::Backend(
                self.message.unwrap_or_else(|| context.to_string()),
            )),
        }
    }
}

/// User part of the stored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "_id", default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub subscribers: u64,
}

impl SessionUser {
    /// Backend identifier of the user
    pub fn user_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.object_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Authenticated session as stored by the auth collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user: SessionUser,
}

impl SessionData {
    /// A session is usable when it carries a token and a user id
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && self.user.user_id().is_some()
    }
}
