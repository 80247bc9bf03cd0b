//! Collaboration: invitations and channel collaborators

use chrono::{DateTime, Utc};
use common::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{StudioError, StudioResult};
use crate::repositories::{Collection, next_id};
use crate::validation::validate_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    Editor,
    Viewer,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: i64,
    pub email: String,
    pub role: CollaboratorRole,
    pub permissions: Vec<String>,
    pub status: InvitationStatus,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: i64,
    pub email: String,
    pub role: CollaboratorRole,
    pub permissions: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CollaborationManager<K> {
    collaborators: Collection<K, Collaborator>,
    invitations: Collection<K, Invitation>,
}

impl<K: KeyValueStore + Clone> CollaborationManager<K> {
    pub fn new(
        store: K,
        collaborators_key: impl Into<String>,
        invitations_key: impl Into<String>,
    ) -> Self {
        Self {
            collaborators: Collection::new(store.clone(), collaborators_key),
            invitations: Collection::new(store, invitations_key),
        }
    }

    pub async fn invite(
        &self,
        email: &str,
        role: CollaboratorRole,
        permissions: Vec<String>,
    ) -> StudioResult<Invitation> {
        validate_email(email)?;
        info!("Inviting {} as {:?}", email, role);

        let invitation = Invitation {
            id: next_id(),
            email: email.to_string(),
            role,
            permissions,
            status: InvitationStatus::Pending,
            sent_at: Utc::now(),
        };
        let record = invitation.clone();
        self.invitations.update(move |all| all.push(record)).await?;
        Ok(invitation)
    }

    pub async fn invitations(&self) -> StudioResult<Vec<Invitation>> {
        self.invitations.load().await
    }

    /// Turn a pending invitation into a collaborator
    pub async fn accept_invitation(&self, invitation_id: i64) -> StudioResult<Collaborator> {
        let invitation = self
            .invitations
            .update(|all| {
                all.iter_mut()
                    .find(|invitation| {
                        invitation.id == invitation_id
                            && invitation.status == InvitationStatus::Pending
                    })
                    .map(|invitation| {
                        invitation.status = InvitationStatus::Accepted;
                        invitation.clone()
                    })
            })
            .await?
            .ok_or_else(|| {
                StudioError::NotFound(format!("pending invitation {}", invitation_id))
            })?;

        let collaborator = Collaborator {
            id: next_id(),
            email: invitation.email,
            role: invitation.role,
            permissions: invitation.permissions,
            joined_at: Utc::now(),
        };
        let record = collaborator.clone();
        self.collaborators.update(move |all| all.push(record)).await?;
        Ok(collaborator)
    }

    pub async fn collaborators(&self) -> StudioResult<Vec<Collaborator>> {
        self.collaborators.load().await
    }

    /// Replace the permissions of a collaborator; false when unknown
    pub async fn update_permissions(
        &self,
        collaborator_id: i64,
        permissions: Vec<String>,
    ) -> StudioResult<bool> {
        self.collaborators
            .update(move |all| {
                match all.iter_mut().find(|c| c.id == collaborator_id) {
                    Some(collaborator) => {
                        collaborator.permissions = permissions;
                        true
                    }
                    None => false,
                }
            })
            .await
    }
}
