//! A/B tests of titles, thumbnails and descriptions

use chrono::{DateTime, Utc};
use common::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StudioResult;
use crate::repositories::{Collection, next_id};
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantResult {
    pub variant: Variant,
    pub views: u64,
    pub clicks: u64,
    pub engagement: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTest {
    pub id: i64,
    pub video_id: String,
    pub variants: Vec<Variant>,
    pub results: Vec<VariantResult>,
    pub status: TestStatus,
    pub started_at: DateTime<Utc>,
    /// Index into `variants`
    #[serde(default)]
    pub winner: Option<usize>,
}

#[derive(Clone)]
pub struct AbTestManager<K> {
    tests: Collection<K, AbTest>,
}

impl<K: KeyValueStore> AbTestManager<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            tests: Collection::new(store, key),
        }
    }

    pub async fn create_test(&self, video_id: &str, variants: Vec<Variant>) -> StudioResult<AbTest> {
        if variants.len() < 2 {
            return Err(
                ValidationError::Invalid("An A/B test needs at least two variants".to_string())
                    .into(),
            );
        }
        info!("Starting A/B test for video {} with {} variants", video_id, variants.len());

        let results = variants
            .iter()
            .map(|variant| VariantResult {
                variant: variant.clone(),
                views: 0,
                clicks: 0,
                engagement: 0,
            })
            .collect();
        let test = AbTest {
            id: next_id(),
            video_id: video_id.to_string(),
            variants,
            results,
            status: TestStatus::Running,
            started_at: Utc::now(),
            winner: None,
        };

        let record = test.clone();
        self.tests.update(move |tests| tests.push(record)).await?;
        Ok(test)
    }

    pub async fn tests(&self) -> StudioResult<Vec<AbTest>> {
        self.tests.load().await
    }

    /// Complete a test with `variant_index` as winner; false when the test is unknown
    pub async fn select_winner(&self, test_id: i64, variant_index: usize) -> StudioResult<bool> {
        let mut tests = self.tests.load().await?;
        let Some(test) = tests.iter_mut().find(|test| test.id == test_id) else {
            return Ok(false);
        };
        if variant_index >= test.variants.len() {
            return Err(ValidationError::Invalid(format!(
                "Variant {} does not exist",
                variant_index
            ))
            .into());
        }

        test.winner = Some(variant_index);
        test.status = TestStatus::Completed;
        self.tests.save(&tests).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use common::store::MemoryStore;

    fn variant(title: &str) -> Variant {
        Variant {
            title: title.to_string(),
            thumbnail: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_select_winner() {
        let manager = AbTestManager::new(MemoryStore::new(), "ab_tests");

        let test = manager
            .create_test("v1", vec![variant("A"), variant("B")])
            .await
            .unwrap();
        assert_eq!(test.status, TestStatus::Running);
        assert_eq!(test.results.len(), 2);
        assert_eq!(test.results[1].views, 0);

        assert!(manager.select_winner(test.id, 1).await.unwrap());
        let stored = &manager.tests().await.unwrap()[0];
        assert_eq!(stored.winner, Some(1));
        assert_eq!(stored.status, TestStatus::Completed);

        assert!(!manager.select_winner(test.id + 1_000_000, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_tests_are_rejected() {
        let manager = AbTestManager::new(MemoryStore::new(), "ab_tests");

        let err = manager.create_test("v1", vec![variant("A")]).await.unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));

        let test = manager
            .create_test("v1", vec![variant("A"), variant("B")])
            .await
            .unwrap();
        assert!(manager.select_winner(test.id, 2).await.is_err());
        assert_eq!(manager.tests().await.unwrap()[0].winner, None);
    }
}
