//! Application state shared across handlers

use std::path::PathBuf;

use sqlx::PgPool;

use crate::{
    jwt::JwtService,
    repositories::{ChannelRepository, UserRepository},
    storage::MediaStorage,
};

/// Application state shared across handlers. Built once at startup from
/// environment configuration; never re-read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub user_repository: UserRepository,
    pub channel_repository: ChannelRepository,
    pub media_storage: MediaStorage,
    pub jwt_service: JwtService,
    /// Directory where multipart uploads are staged before the media store
    pub upload_dir: PathBuf,
}
