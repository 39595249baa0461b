//! Watch-history projections

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Denormalized owner summary attached to each watch-history entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

/// A video resolved from the user's watch-history sequence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryVideo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<f64>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner: VideoOwner,
}
