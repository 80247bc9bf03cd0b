//! Repositories for the creator tools persisted in the key-value store
//!
//! Each collection is an ordered list serialized whole under one key and
//! rewritten on every mutation. Concurrent writers follow last-write-wins.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use common::store::{KeyValueStore, load_json, save_json};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::StudioResult;

pub mod ab_tests;
pub mod collaborators;
pub mod library;
pub mod scheduled;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp id, strictly increasing within the process
pub fn next_id() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::SeqCst);
    loop {
        let id = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, id, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return id,
            Err(actual) => last = actual,
        }
    }
}

/// A list of records stored as one JSON array
#[derive(Clone)]
pub struct Collection<K, T> {
    store: K,
    key: String,
    _records: PhantomData<fn() -> T>,
}

impl<K, T> Collection<K, T>
where
    K: KeyValueStore,
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _records: PhantomData,
        }
    }

    /// All records; a missing key is an empty collection
    pub async fn load(&self) -> StudioResult<Vec<T>> {
        Ok(load_json::<K, Vec<T>>(&self.store, &self.key)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, records: &[T]) -> StudioResult<()> {
        debug!("Saving {} records under {}", records.len(), self.key);
        save_json(&self.store, &self.key, &records).await?;
        Ok(())
    }

    /// Read, modify and write back the whole collection
    pub async fn update<R>(&self, modify: impl FnOnce(&mut Vec<T>) -> R) -> StudioResult<R> {
        let mut records = self.load().await?;
        let result = modify(&mut records);
        self.save(&records).await?;
        Ok(result)
    }
}
