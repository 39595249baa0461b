//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database is properly configured
//! and accessible from the application. They require a running PostgreSQL
//! instance and are ignored by default.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

/// Verifies connectivity, migrations, and a simple query round trip
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    // The migrated schema must expose the three core tables
    let tables: Vec<String> = sqlx::query(
        "SELECT table_name FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_name IN ('users', 'videos', 'subscriptions')",
    )
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|row| row.get("table_name"))
    .collect();

    assert_eq!(tables.len(), 3, "Expected users, videos and subscriptions");

    Ok(())
}
