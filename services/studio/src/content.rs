//! Content management actions on the creator's videos

use std::sync::Arc;

use common::signal::{SignalBus, StudioSignal};
use tracing::{error, info};

use crate::api::VideoApi;
use crate::auth::AuthService;
use crate::error::{StudioError, StudioResult};
use crate::sync::Synchronize;

pub struct ContentManager<A, U, S> {
    api: Arc<A>,
    auth: Arc<U>,
    sync: Arc<S>,
    bus: SignalBus,
}

impl<A: VideoApi, U: AuthService, S: Synchronize> ContentManager<A, U, S> {
    pub fn new(api: Arc<A>, auth: Arc<U>, sync: Arc<S>, bus: SignalBus) -> Self {
        Self {
            api,
            auth,
            sync,
            bus,
        }
    }

    /// Delete a video, resynchronize, and tell other instances about it
    pub async fn delete_video(&self, id: &str) -> StudioResult<()> {
        let session = self
            .auth
            .get_session_data()
            .await
            .filter(|session| session.is_valid())
            .ok_or(StudioError::Unauthenticated)?;

        info!("Deleting video {}", id);
        self.api
            .delete_video(&session.token, id)
            .await
            .inspect_err(|e| error!("Failed to delete video {}: {}", id, e))?;

        info!("Video {} deleted", id);
        self.sync.synchronize().await;
        self.bus.publish(StudioSignal::VideoDeleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ApiCall, CountingSync, FakeVideoApi, StaticAuth, video};

    #[tokio::test]
    async fn test_delete_resyncs_and_signals() {
        let api = Arc::new(FakeVideoApi::with_videos(vec![video("v1", 1)], Vec::new()));
        let sync = Arc::new(CountingSync::new());
        let bus = SignalBus::default();
        let mut signals = bus.subscribe();

        let manager = ContentManager::new(
            api.clone(),
            Arc::new(StaticAuth::signed_in("u1")),
            sync.clone(),
            bus.clone(),
        );
        manager.delete_video("v1").await.unwrap();

        assert_eq!(api.calls(), vec![ApiCall::Delete("v1".to_string())]);
        assert_eq!(sync.runs(), 1);

        let envelope = signals.recv().await.unwrap();
        assert_eq!(envelope.signal, StudioSignal::VideoDeleted);
        assert_eq!(envelope.origin, bus.instance_id());
    }

    #[tokio::test]
    async fn test_failed_delete_surfaces_backend_message() {
        let api = Arc::new(FakeVideoApi::new());
        api.fail_delete("Not authorized to delete this video");
        let sync = Arc::new(CountingSync::new());
        let bus = SignalBus::default();
        let mut signals = bus.subscribe();

        let manager = ContentManager::new(
            api,
            Arc::new(StaticAuth::signed_in("u1")),
            sync.clone(),
            bus,
        );
        let err = manager.delete_video("v1").await.unwrap_err();

        assert_eq!(err.to_string(), "Not authorized to delete this video");
        assert_eq!(sync.runs(), 0);
        assert!(signals.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_requires_session() {
        let api = Arc::new(FakeVideoApi::new());
        let manager = ContentManager::new(
            api.clone(),
            Arc::new(StaticAuth::signed_out()),
            Arc::new(CountingSync::new()),
            SignalBus::default(),
        );

        assert!(matches!(
            manager.delete_video("v1").await,
            Err(StudioError::Unauthenticated)
        ));
        assert!(api.calls().is_empty());
    }
}
