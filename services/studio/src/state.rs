//! Application state shared across handlers

use std::sync::Arc;

use common::signal::SignalBus;
use common::store::Store;

use crate::analytics::CreatorAnalytics;
use crate::api::{HttpVideoApi, VideoApi};
use crate::auth::StoreAuthService;
use crate::config::StudioConfig;
use crate::content::ContentManager;
use crate::edit::EditWorkflow;
use crate::monitor::PathwayMonitor;
use crate::refresh::RefreshCoordinator;
use crate::render::Surfaces;
use crate::repositories::ab_tests::AbTestManager;
use crate::repositories::collaborators::CollaborationManager;
use crate::repositories::library::ContentLibrary;
use crate::repositories::scheduled::SmartScheduler;
use crate::sync::VideoSynchronizer;

pub type Auth = StoreAuthService<Store>;
pub type Synchronizer<A> = VideoSynchronizer<A, Auth>;

/// Application state shared across handlers
pub struct AppState<A = HttpVideoApi> {
    pub config: Arc<StudioConfig>,
    pub bus: SignalBus,
    pub surfaces: Surfaces,
    pub synchronizer: Arc<Synchronizer<A>>,
    pub refresh: Arc<RefreshCoordinator<Synchronizer<A>>>,
    pub edit: Arc<EditWorkflow<A, Auth, Synchronizer<A>>>,
    pub content: Arc<ContentManager<A, Auth, Synchronizer<A>>>,
    pub analytics: Arc<CreatorAnalytics<A, Auth>>,
    pub monitor: Arc<PathwayMonitor<A, Store>>,
    pub scheduler: SmartScheduler<Store>,
    pub collaboration: CollaborationManager<Store>,
    pub library: ContentLibrary<Store>,
    pub ab_tests: AbTestManager<Store>,
}

// Not derived: `A` is only held behind `Arc` and need not be `Clone`
impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            bus: self.bus.clone(),
            surfaces: self.surfaces.clone(),
            synchronizer: self.synchronizer.clone(),
            refresh: self.refresh.clone(),
            edit: self.edit.clone(),
            content: self.content.clone(),
            analytics: self.analytics.clone(),
            monitor: self.monitor.clone(),
            scheduler: self.scheduler.clone(),
            collaboration: self.collaboration.clone(),
            library: self.library.clone(),
            ab_tests: self.ab_tests.clone(),
        }
    }
}

impl<A: VideoApi> AppState<A> {
    /// Wire every component around one backend client and one store
    pub fn new(config: StudioConfig, api: Arc<A>, store: Store, bus: SignalBus) -> Self {
        let config = Arc::new(config);
        let auth = Arc::new(StoreAuthService::new(store.clone(), config.session_key.clone()));
        let surfaces = Surfaces::new();

        let upload_page = config
            .pages
            .get("upload")
            .cloned()
            .unwrap_or_else(|| "upload.html".to_string());
        let synchronizer = Arc::new(VideoSynchronizer::new(
            api.clone(),
            auth.clone(),
            surfaces.clone(),
            config.fallback_policy,
            config.login_redirect(),
            upload_page,
        ));

        let refresh = Arc::new(RefreshCoordinator::new(
            synchronizer.clone(),
            config.refresh.cooldown(),
        ));
        let edit = Arc::new(EditWorkflow::new(
            api.clone(),
            auth.clone(),
            synchronizer.clone(),
            config.thumbnail_delivery,
            config.uploads_base_url.clone(),
        ));
        let content = Arc::new(ContentManager::new(
            api.clone(),
            auth.clone(),
            synchronizer.clone(),
            bus.clone(),
        ));
        let analytics = Arc::new(CreatorAnalytics::new(api.clone(), auth));
        let monitor = Arc::new(PathwayMonitor::new(config.clone(), api, store.clone()));

        let scheduler = SmartScheduler::new(store.clone(), config.storage_key("scheduledVideos"));
        let collaboration = CollaborationManager::new(
            store.clone(),
            config.storage_key("collaborators"),
            config.storage_key("invitations"),
        );
        let library = ContentLibrary::new(
            store.clone(),
            config.storage_key("library"),
            config.storage_key("folders"),
        );
        let ab_tests = AbTestManager::new(store, config.storage_key("abTests"));

        Self {
            config,
            bus,
            surfaces,
            synchronizer,
            refresh,
            edit,
            content,
            analytics,
            monitor,
            scheduler,
            collaboration,
            library,
            ab_tests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeVideoApi, video};
    use common::signal::{DEFAULT_CAPACITY, SignalBus};
    use common::store::{KeyValueStore, MemoryStore};
    use std::time::Duration;

    async fn instance(store: &MemoryStore) -> (AppState<FakeVideoApi>, Arc<FakeVideoApi>) {
        let bus = SignalBus::connect(DEFAULT_CAPACITY, store.signal_relay())
            .await
            .unwrap();
        let api = Arc::new(FakeVideoApi::with_videos(vec![video("v1", 10)], Vec::new()));
        let state = AppState::new(
            StudioConfig::default(),
            api.clone(),
            Store::Memory(store.clone()),
            bus.clone(),
        );
        tokio::spawn(
            state
                .refresh
                .clone()
                .listen(bus.subscribe(), bus.instance_id()),
        );
        (state, api)
    }

    #[tokio::test]
    async fn test_delete_refreshes_other_instance_on_shared_store() {
        let store = MemoryStore::new();
        store
            .set(
                "bhuban_session",
                r#"{"token":"t0k","user":{"_id":"u1","name":"ana","subscribers":3}}"#,
            )
            .await
            .unwrap();
        let (first, first_api) = instance(&store).await;
        let (_second, second_api) = instance(&store).await;

        first.content.delete_video("v1").await.unwrap();
        let first_calls = first_api.list_calls();

        for _ in 0..100 {
            if second_api.list_calls() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(second_api.list_calls() > 0);
        // The deleting instance resynced directly and ignored its own echo
        assert_eq!(first_api.list_calls(), first_calls);
    }
}
