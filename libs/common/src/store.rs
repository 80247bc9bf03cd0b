//! Key-value store module for the creator studio
//!
//! This module provides the string-keyed store the studio persists its
//! session data and creator collections into. Two backends are available:
//! an in-process memory store and a Redis store that lets several studio
//! instances share the same data.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::signal::{REDIS_SIGNAL_CHANNEL, SignalRelay};

/// A string-keyed store holding JSON-encoded values.
///
/// Writes replace the whole value stored under a key; there are no partial
/// updates and no optimistic concurrency checks.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    /// Set a key-value pair, replacing any previous value
    fn set(&self, key: &str, value: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete a key
    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Check if the store is reachable
    fn health_check(&self) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Read and decode a JSON value stored under `key`
pub async fn load_json<S, T>(store: &S, key: &str) -> StoreResult<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`
pub async fn save_json<S, T>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

/// In-process store backed by a shared map
///
/// Clones share both the entries and one signal relay.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    relay: SignalRelay,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self {
            entries: Arc::default(),
            relay: SignalRelay::memory(),
        }
    }

    /// Relay shared by every clone of this store
    pub fn signal_relay(&self) -> SignalRelay {
        self.relay.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(StoreError::Configuration(format!(
                "Invalid Redis URL: {}",
                url
            )));
        }

        Ok(RedisConfig { url })
    }
}

/// Redis-backed store shared between studio instances
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Initialize a new Redis store
    pub fn new(config: &RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.clone()).map_err(StoreError::Connection)?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisStore { client })
    }

    /// Relay over Redis PUBLISH/SUBSCRIBE on the studio signal channel
    pub fn signal_relay(&self) -> SignalRelay {
        SignalRelay::Redis {
            client: self.client.clone(),
            channel: REDIS_SIGNAL_CHANNEL.to_string(),
        }
    }

    /// Get a connection from the client
    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Connection)
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(StoreError::Command)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(key, value).await.map_err(StoreError::Command)?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await.map_err(StoreError::Command)?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::Command)?;
        Ok(pong == "PONG")
    }
}

/// Store selected at startup
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl Store {
    /// Build the store named by `STORE_BACKEND` (`memory` or `redis`, default `memory`)
    pub fn from_env() -> StoreResult<Self> {
        let backend = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());
        match backend.as_str() {
            "memory" => Ok(Store::Memory(MemoryStore::new())),
            "redis" => Ok(Store::Redis(RedisStore::new(&RedisConfig::from_env()?)?)),
            other => Err(StoreError::Configuration(format!(
                "Unknown store backend: {}",
                other
            ))),
        }
    }

    /// Relay connecting every studio instance that shares this store
    pub fn signal_relay(&self) -> SignalRelay {
        match self {
            Store::Memory(store) => store.signal_relay(),
            Store::Redis(store) => store.signal_relay(),
        }
    }

    /// Human-readable name of the backend
    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Redis(_) => "redis",
        }
    }
}

impl KeyValueStore for Store {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self {
            Store::Memory(store) => store.get(key).await,
            Store::Redis(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match self {
            Store::Memory(store) => store.set(key, value).await,
            Store::Redis(store) => store.set(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match self {
            Store::Memory(store) => store.delete(key).await,
            Store::Redis(store) => store.delete(key).await,
        }
    }

    async fn health_check(&self) -> StoreResult<bool> {
        match self {
            Store::Memory(store) => store.health_check().await,
            Store::Redis(store) => store.health_check().await,
        }
    }
}
