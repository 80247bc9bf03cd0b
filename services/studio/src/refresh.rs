//! Refresh coordinator
//!
//! Signals from other studio instances, focus events and the periodic timer
//! all funnel into [`RefreshCoordinator::trigger`], which lets at most one
//! synchronization through per cooldown window.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use common::signal::{SignalEnvelope, StudioSignal};
use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sync::Synchronize;

/// What asked for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Signal(StudioSignal),
    Focus,
    Timer,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTrigger::Signal(signal) => write!(f, "{} signal", signal),
            RefreshTrigger::Focus => f.write_str("focus"),
            RefreshTrigger::Timer => f.write_str("timer"),
        }
    }
}

pub struct RefreshCoordinator<S> {
    target: Arc<S>,
    cooldown: Duration,
    last_refresh: Mutex<Option<Instant>>,
}

impl<S: Synchronize> RefreshCoordinator<S> {
    pub fn new(target: Arc<S>, cooldown: Duration) -> Self {
        Self {
            target,
            cooldown,
            last_refresh: Mutex::new(None),
        }
    }

    /// Run the synchronizer unless a refresh ran less than the cooldown ago.
    ///
    /// Returns whether a refresh was executed. Dropped triggers are not
    /// queued.
    pub async fn trigger(&self, trigger: RefreshTrigger) -> bool {
        {
            let mut last_refresh = self.last_refresh.lock().await;
            let now = Instant::now();
            let elapsed = last_refresh.map(|last| now.duration_since(last));
            if let Some(elapsed) = elapsed.filter(|elapsed| *elapsed < self.cooldown) {
                debug!("Skipping {} refresh, last one ran {:?} ago", trigger, elapsed);
                return false;
            }
            *last_refresh = Some(now);
        }

        info!("Refreshing videos ({})", trigger);
        self.target.synchronize().await;
        true
    }

    /// Turn bus signals into refresh triggers until the bus closes.
    ///
    /// Signals published by `own_origin` are ignored; that instance has
    /// already refreshed itself.
    pub async fn listen(self: Arc<Self>, mut signals: broadcast::Receiver<SignalEnvelope>, own_origin: Uuid) {
        loop {
            match signals.recv().await {
                Ok(envelope) if envelope.origin == own_origin => {
                    debug!("Ignoring own {} signal", envelope.signal);
                }
                Ok(envelope) => {
                    self.trigger(RefreshTrigger::Signal(envelope.signal)).await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Missed {} refresh signals", missed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Signal bus closed, stopping refresh listener");
                    break;
                }
            }
        }
    }
}
