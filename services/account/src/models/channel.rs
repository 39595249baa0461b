//! Channel profile projection

use serde::Serialize;
use uuid::Uuid;

/// Read-time channel summary: the user's public fields joined with
/// subscription counts and the requester's membership.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    /// Count of users subscribed to this channel
    pub subscribers_count: i64,
    /// Count of channels this user subscribes to
    pub channels_subscribed_to_count: i64,
    /// Whether the requesting user is among this channel's subscribers
    pub is_subscribed: bool,
}
