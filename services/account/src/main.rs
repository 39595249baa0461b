use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod response;
mod routes;
mod state;
mod storage;
mod validation;

use std::path::PathBuf;

use common::database::{self, DatabaseConfig};
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    repositories::{ChannelRepository, UserRepository},
    state::AppState,
    storage::{MediaStorage, StorageConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting account service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Initialize collaborators
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let media_storage = MediaStorage::new(StorageConfig::from_env()?).await;
    let user_repository = UserRepository::new(pool.clone());
    let channel_repository = ChannelRepository::new(pool.clone());

    let upload_dir = std::env::var("UPLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("account-uploads"));

    let app_state = AppState {
        db_pool: pool,
        user_repository,
        channel_repository,
        media_storage,
        jwt_service,
        upload_dir,
    };

    info!("Account service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Account service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
