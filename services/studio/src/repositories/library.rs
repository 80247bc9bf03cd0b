//! Content library: reusable assets and folders

use chrono::{DateTime, Utc};
use common::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StudioResult;
use crate::repositories::{Collection, next_id};

pub const DEFAULT_FOLDER: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub folder: String,
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
}

/// Asset to add; `folder` defaults to [`DEFAULT_FOLDER`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub folder: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub parent: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ContentLibrary<K> {
    assets: Collection<K, Asset>,
    folders: Collection<K, Folder>,
}

impl<K: KeyValueStore + Clone> ContentLibrary<K> {
    pub fn new(store: K, assets_key: impl Into<String>, folders_key: impl Into<String>) -> Self {
        Self {
            assets: Collection::new(store.clone(), assets_key),
            folders: Collection::new(store, folders_key),
        }
    }

    pub async fn add_asset(&self, new: NewAsset) -> StudioResult<Asset> {
        info!("Adding {} to the content library", new.name);
        let asset = Asset {
            id: next_id(),
            name: new.name,
            mime_type: new.mime_type,
            size: new.size,
            folder: new.folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            uploaded_at: Utc::now(),
            url: new.url,
        };
        let record = asset.clone();
        self.assets.update(move |assets| assets.push(record)).await?;
        Ok(asset)
    }

    /// Assets, optionally restricted to one folder
    pub async fn assets(&self, folder: Option<&str>) -> StudioResult<Vec<Asset>> {
        let mut assets = self.assets.load().await?;
        if let Some(folder) = folder {
            assets.retain(|asset| asset.folder == folder);
        }
        Ok(assets)
    }

    pub async fn delete_asset(&self, asset_id: i64) -> StudioResult<bool> {
        self.assets
            .update(|assets| {
                let before = assets.len();
                assets.retain(|asset| asset.id != asset_id);
                assets.len() != before
            })
            .await
    }

    pub async fn create_folder(&self, name: &str, parent: Option<i64>) -> StudioResult<Folder> {
        let folder = Folder {
            id: next_id(),
            name: name.to_string(),
            parent,
            created_at: Utc::now(),
        };
        let record = folder.clone();
        self.folders.update(move |folders| folders.push(record)).await?;
        Ok(folder)
    }

    pub async fn folders(&self) -> StudioResult<Vec<Folder>> {
        self.folders.load().await
    }
}
