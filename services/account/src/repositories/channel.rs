//! Read-side aggregations over subscriptions and videos
//!
//! Both aggregations are single declarative queries handed to PostgreSQL,
//! not procedural loops: the channel profile is two correlated counts plus
//! a membership check, and the watch history is an ordinality-preserving
//! join from the user's stored id sequence.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ChannelProfile, VideoOwner, WatchHistoryVideo},
};

/// Repository for read-time relational aggregations
#[derive(Clone)]
pub struct ChannelRepository {
    pool: PgPool,
}

impl ChannelRepository {
    /// Create a new channel repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Compute the channel summary for `username` as of read time.
    ///
    /// `viewer` is the requesting identity and only feeds the
    /// `is_subscribed` membership check. Returns `None` when no user
    /// matches the username.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> AppResult<Option<ChannelProfile>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.full_name, u.email, u.avatar_url, u.cover_image_url,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                       AS subscribers_count,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                       AS channels_subscribed_to_count,
                   EXISTS(SELECT 1 FROM subscriptions s
                          WHERE s.channel_id = u.id AND s.subscriber_id = $2)
                       AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let profile = ChannelProfile {
                    id: row.get("id"),
                    username: row.get("username"),
                    full_name: row.get("full_name"),
                    email: row.get("email"),
                    avatar: row.get("avatar_url"),
                    cover_image: row.get("cover_image_url"),
                    subscribers_count: row.get("subscribers_count"),
                    channels_subscribed_to_count: row.get("channels_subscribed_to_count"),
                    is_subscribed: row.get("is_subscribed"),
                };
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Resolve a user's watch history into video records with a
    /// denormalized owner summary, preserving viewing order and duplicates.
    ///
    /// Fails with `NotFound` when the user row is absent; an existing user
    /// with an empty history yields an empty list. History ids with no
    /// matching video are dropped by the join.
    pub async fn watch_history(&self, user_id: Uuid) -> AppResult<Vec<WatchHistoryVideo>> {
        let history: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT watch_history FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let history = history.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if history.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query(
            r#"
            SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                   v.duration, v.views, v.created_at,
                   o.id AS owner_id, o.full_name AS owner_full_name,
                   o.username AS owner_username, o.avatar_url AS owner_avatar_url
            FROM unnest($1::uuid[]) WITH ORDINALITY AS h(video_id, ord)
            JOIN videos v ON v.id = h.video_id
            JOIN users o ON o.id = v.owner_id
            ORDER BY h.ord
            "#,
        )
        .bind(&history)
        .fetch_all(&self.pool)
        .await?;

        let videos = rows
            .into_iter()
            .map(|row| WatchHistoryVideo {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                video_url: row.get("video_url"),
                thumbnail_url: row.get("thumbnail_url"),
                duration: row.get("duration"),
                views: row.get("views"),
                created_at: row.get("created_at"),
                owner: VideoOwner {
                    id: row.get("owner_id"),
                    full_name: row.get("owner_full_name"),
                    username: row.get("owner_username"),
                    avatar: row.get("owner_avatar_url"),
                },
            })
            .collect();

        Ok(videos)
    }
}
