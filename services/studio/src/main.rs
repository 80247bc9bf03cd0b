use std::sync::Arc;

use anyhow::Result;
use common::signal::{DEFAULT_CAPACITY, SignalBus};
use common::store::{KeyValueStore, Store};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

mod analytics;
mod api;
mod auth;
mod config;
mod content;
mod edit;
mod error;
mod models;
mod monitor;
mod refresh;
mod render;
mod repositories;
mod routes;
mod state;
mod sync;
#[cfg(test)]
mod testing;
mod thumbnail;
mod validation;

use api::HttpVideoApi;
use config::StudioConfig;
use monitor::Health;
use refresh::RefreshTrigger;
use state::AppState;
use sync::{SyncOutcome, Synchronize};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting creator studio service");

    let config = StudioConfig::load()?;

    let store = Store::from_env()?;
    if store.health_check().await? {
        info!("Store connection successful ({})", store.backend_name());
    } else {
        anyhow::bail!("Failed to connect to {} store", store.backend_name());
    }

    let api = HttpVideoApi::new(&config.api_base_url)?;
    info!("Using backend API at {}", api.base_url());

    let bus = SignalBus::connect(DEFAULT_CAPACITY, store.signal_relay()).await?;
    let state = AppState::new(config, Arc::new(api), store, bus.clone());

    // React to change signals from other studio instances
    tokio::spawn(
        state
            .refresh
            .clone()
            .listen(bus.subscribe(), bus.instance_id()),
    );

    match state.synchronizer.synchronize().await {
        SyncOutcome::LoginRequired { redirect } => {
            warn!("No authenticated session, login required at {}", redirect)
        }
        outcome => info!("Initial synchronization: {:?}", outcome),
    }
    state.monitor.run().await;

    let scheduler = JobScheduler::new().await?;

    let refresh = state.refresh.clone();
    let refresh_job = Job::new_async(state.config.refresh.schedule.as_str(), move |_, _| {
        let refresh = refresh.clone();
        Box::pin(async move {
            refresh.trigger(RefreshTrigger::Timer).await;
        })
    })?;
    scheduler.add(refresh_job).await?;

    let monitor = state.monitor.clone();
    let mut health = monitor.subscribe();
    let monitor_job = Job::new_async(state.config.monitor.schedule.as_str(), move |_, _| {
        let monitor = monitor.clone();
        Box::pin(async move {
            monitor.run().await;
        })
    })?;
    scheduler.add(monitor_job).await?;
    scheduler.start().await?;

    info!(
        "Started refresh ({}) and pathway ({}) schedules",
        state.config.refresh.schedule, state.config.monitor.schedule
    );

    tokio::spawn(async move {
        loop {
            match health.recv().await {
                Ok(summary) => match summary.status {
                    Health::Healthy => {}
                    Health::Warning => warn!("Pathway health: {}", summary.message),
                    Health::Error => error!("Pathway health degraded: {}", summary.message),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} pathway summaries", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let listen_addr = state.config.listen_addr.clone();
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Creator studio listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
