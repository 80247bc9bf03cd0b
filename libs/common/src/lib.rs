//! Common library for the creator studio
//!
//! This crate provides shared functionality used by the studio service,
//! including the key-value store backends, their error types, and the
//! typed signal bus that propagates video changes between instances.

pub mod error;
pub mod signal;
pub mod store;

/// Example usage of the store module
///
/// ```rust,no_run
/// use common::store::{KeyValueStore, Store, load_json, save_json};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Store::from_env()?;
///     save_json(&store, "scheduled_videos", &Vec::<String>::new()).await?;
///     let saved: Option<Vec<String>> = load_json(&store, "scheduled_videos").await?;
///     println!("Store health check: {}", store.health_check().await?);
///     println!("Scheduled videos: {:?}", saved);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
