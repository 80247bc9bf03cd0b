//! Typed broadcast channel for studio change signals
//!
//! Any studio instance may publish a signal when it changes the video set;
//! every subscriber receives it and decides whether to refresh. A bus
//! connected to a [`SignalRelay`] also exchanges its signals with every
//! other bus on the same relay, e.g. all instances sharing one Redis.

use std::fmt;

use futures::StreamExt;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Default number of undelivered signals buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 16;

/// Redis channel studio instances exchange signals on
pub const REDIS_SIGNAL_CHANNEL: &str = "studio:signals";

/// Change signals shared between studio instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StudioSignal {
    /// A video was uploaded
    VideoUploaded,
    /// A video was deleted
    VideoDeleted,
    /// A refresh was explicitly requested
    ForceRefresh,
}

impl StudioSignal {
    /// Map a legacy storage sentinel key onto its signal
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "videoUploaded" => Some(StudioSignal::VideoUploaded),
            "videoDeleted" => Some(StudioSignal::VideoDeleted),
            "forceRefresh" => Some(StudioSignal::ForceRefresh),
            _ => None,
        }
    }
}

impl fmt::Display for StudioSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StudioSignal::VideoUploaded => "video uploaded",
            StudioSignal::VideoDeleted => "video deleted",
            StudioSignal::ForceRefresh => "force refresh",
        };
        f.write_str(name)
    }
}

/// A signal together with the instance that published it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub origin: Uuid,
    pub signal: StudioSignal,
}

/// Wire form of a relayed signal; `bus` identifies the forwarding bus so it
/// can skip its own echo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RelayMessage {
    bus: Uuid,
    origin: Uuid,
    signal: StudioSignal,
}

/// Shared channel connecting the buses of several studio instances
#[derive(Debug, Clone)]
pub enum SignalRelay {
    /// In-process channel shared by every bus holding a clone
    Memory(broadcast::Sender<String>),
    /// Redis PUBLISH/SUBSCRIBE on one channel
    Redis { client: Client, channel: String },
}

impl SignalRelay {
    /// Fresh in-process relay
    pub fn memory() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        SignalRelay::Memory(sender)
    }
}

/// Broadcast bus carrying [`SignalEnvelope`]s
#[derive(Debug, Clone)]
pub struct SignalBus {
    instance_id: Uuid,
    sender: broadcast::Sender<SignalEnvelope>,
    /// Outgoing wire messages, present once connected to a relay
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl SignalBus {
    /// Create a new bus buffering up to `capacity` undelivered signals per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            instance_id: Uuid::new_v4(),
            sender,
            outbound: None,
        }
    }

    /// Create a bus that forwards every publish to `relay` and re-broadcasts
    /// signals other buses put on it, keeping their origin
    pub async fn connect(capacity: usize, relay: SignalRelay) -> StoreResult<Self> {
        let mut bus = Self::new(capacity);
        let (outbound, outgoing) = mpsc::unbounded_channel();
        bus.outbound = Some(outbound);

        match relay {
            SignalRelay::Memory(channel) => {
                let incoming = channel.subscribe();
                tokio::spawn(forward_memory(outgoing, channel));
                tokio::spawn(receive_memory(bus.instance_id, bus.sender.clone(), incoming));
                debug!("Signal bus {} joined in-process relay", bus.instance_id);
            }
            SignalRelay::Redis { client, channel } => {
                let mut pubsub = client
                    .get_async_pubsub()
                    .await
                    .map_err(StoreError::Connection)?;
                pubsub
                    .subscribe(&channel)
                    .await
                    .map_err(StoreError::Command)?;
                let conn = client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(StoreError::Connection)?;

                tokio::spawn(forward_redis(outgoing, conn, channel.clone()));
                let instance_id = bus.instance_id;
                let local = bus.sender.clone();
                tokio::spawn(async move {
                    let mut messages = Box::pin(pubsub.into_on_message());
                    while let Some(message) = messages.next().await {
                        match message.get_payload::<String>() {
                            Ok(raw) => accept(instance_id, &local, &raw),
                            Err(e) => warn!("Unreadable signal payload: {}", e),
                        }
                    }
                    warn!("Redis signal subscription ended");
                });
                info!("Signal bus {} subscribed to Redis channel {}", bus.instance_id, channel);
            }
        }

        Ok(bus)
    }

    /// Identifier stamped on signals published by this instance
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Publish a signal originating from this instance
    ///
    /// Returns the number of local subscribers that will see it.
    pub fn publish(&self, signal: StudioSignal) -> usize {
        self.publish_from(self.instance_id, signal)
    }

    /// Publish a signal on behalf of `origin`
    pub fn publish_from(&self, origin: Uuid, signal: StudioSignal) -> usize {
        if let Some(outbound) = &self.outbound {
            let message = RelayMessage {
                bus: self.instance_id,
                origin,
                signal,
            };
            match serde_json::to_string(&message) {
                Ok(raw) => {
                    if outbound.send(raw).is_err() {
                        warn!("Signal relay closed, {} signal stays local", signal);
                    }
                }
                Err(e) => warn!("Could not encode {} signal: {}", signal, e),
            }
        }

        let delivered = self
            .sender
            .send(SignalEnvelope { origin, signal })
            .unwrap_or(0);
        debug!("Published {} signal to {} subscriber(s)", signal, delivered);
        delivered
    }

    /// Subscribe to every signal published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SignalEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Re-broadcast a relayed message locally unless this bus sent it
fn accept(bus_id: Uuid, local: &broadcast::Sender<SignalEnvelope>, raw: &str) {
    match serde_json::from_str::<RelayMessage>(raw) {
        Ok(message) if message.bus == bus_id => {}
        Ok(message) => {
            debug!("Relayed {} signal from {}", message.signal, message.origin);
            // No local subscribers is fine
            let _ = local.send(SignalEnvelope {
                origin: message.origin,
                signal: message.signal,
            });
        }
        Err(e) => warn!("Ignoring malformed relayed signal: {}", e),
    }
}

async fn forward_memory(mut outgoing: mpsc::UnboundedReceiver<String>, channel: broadcast::Sender<String>) {
    while let Some(raw) = outgoing.recv().await {
        let _ = channel.send(raw);
    }
}

async fn receive_memory(
    bus_id: Uuid,
    local: broadcast::Sender<SignalEnvelope>,
    mut incoming: broadcast::Receiver<String>,
) {
    loop {
        match incoming.recv().await {
            Ok(raw) => accept(bus_id, &local, &raw),
            Err(RecvError::Lagged(skipped)) => warn!("Missed {} relayed signals", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn forward_redis(
    mut outgoing: mpsc::UnboundedReceiver<String>,
    mut conn: MultiplexedConnection,
    channel: String,
) {
    while let Some(raw) = outgoing.recv().await {
        let published: redis::RedisResult<i64> = conn.publish(&channel, raw).await;
        if let Err(e) = published {
            warn!("Failed to publish signal on {}: {}", channel, e);
        }
    }
}
