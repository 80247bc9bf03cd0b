//! Access to the authenticated session kept by the auth collaborator

use std::future::Future;

use common::store::{KeyValueStore, load_json};
use tracing::warn;

use crate::models::{SessionData, SessionUser};

/// Read side of the auth collaborator
pub trait AuthService: Send + Sync {
    /// Stored session, if any
    fn get_session_data(&self) -> impl Future<Output = Option<SessionData>> + Send;

    /// True when a usable session is stored
    fn is_authenticated(&self) -> impl Future<Output = bool> + Send {
        async move {
            self.get_session_data()
                .await
                .is_some_and(|session| session.is_valid())
        }
    }

    /// User of the stored session
    fn get_user(&self) -> impl Future<Output = Option<SessionUser>> + Send {
        async move { self.get_session_data().await.map(|session| session.user) }
    }
}

/// Auth service reading the session JSON stored under a key
#[derive(Clone)]
pub struct StoreAuthService<S> {
    store: S,
    session_key: String,
}

impl<S: KeyValueStore> StoreAuthService<S> {
    pub fn new(store: S, session_key: impl Into<String>) -> Self {
        Self {
            store,
            session_key: session_key.into(),
        }
    }
}

impl<S: KeyValueStore> AuthService for StoreAuthService<S> {
    async fn get_session_data(&self) -> Option<SessionData> {
        match load_json::<S, SessionData>(&self.store, &self.session_key).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Ignoring unreadable session under {}: {}", self.session_key, e);
                None
            }
        }
    }
}
