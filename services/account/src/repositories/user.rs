//! User repository for database operations
//!
//! Password hashing is a responsibility of this repository, not of the
//! handlers: plain-text passwords come in, argon2 PHC strings go to the
//! database.

use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewUser, User},
};

/// Column list shared across queries to avoid repetition
const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
                            cover_image_url, refresh_token, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a plain-text password into an argon2 PHC string
    pub(crate) fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow!("Failed to hash password: {}", e)))?
            .to_string();
        Ok(password_hash)
    }

    /// Create a new user. A unique-constraint race on username or email
    /// surfaces as a conflict, same as the pre-insert existence check.
    pub async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        info!("Creating new user: {}", new_user.username);

        let password_hash = Self::hash_password(&new_user.password)?;

        let query = format!(
            "INSERT INTO users (username, email, full_name, password_hash, avatar_url, cover_image_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.full_name)
            .bind(&password_hash)
            .bind(&new_user.avatar_url)
            .bind(&new_user.cover_image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                    "User with email or username already exists".to_string(),
                ),
                _ => AppError::from(e),
            })?;

        Ok(user)
    }

    /// Check whether a user with the given username or email already exists
    pub async fn exists_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Find a user by username or email
    pub async fn find_by_username_or_email(&self, identifier: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Verify a plain-text password against the user's stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(anyhow!("Failed to parse password hash: {}", e)))?;

        let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }

    /// Persist (or clear, with `None`) the user's current refresh token.
    /// Overwriting invalidates any previously issued refresh token.
    pub async fn set_refresh_token(&self, id: Uuid, refresh_token: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(refresh_token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Replace the user's password hash
    pub async fn update_password(&self, id: Uuid, new_password: &str) -> AppResult<()> {
        let password_hash = Self::hash_password(new_password)?;

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Replace the user's display name and email
    pub async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> AppResult<Option<User>> {
        let query = format!(
            "UPDATE users SET full_name = $2, email = $3, updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(full_name)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict("Email is already in use".to_string())
                }
                _ => AppError::from(e),
            })?;

        Ok(user)
    }

    /// Replace the user's avatar URL, overwriting the previous one
    pub async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<User>> {
        let query = format!(
            "UPDATE users SET avatar_url = $2, updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(avatar_url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Replace the user's cover-image URL, overwriting the previous one
    pub async fn update_cover_image(
        &self,
        id: Uuid,
        cover_image_url: &str,
    ) -> AppResult<Option<User>> {
        let query = format!(
            "UPDATE users SET cover_image_url = $2, updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(cover_image_url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = UserRepository::hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password("correct horse battery".as_bytes(), &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password("wrong password".as_bytes(), &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = UserRepository::hash_password("same password").unwrap();
        let second = UserRepository::hash_password("same password").unwrap();
        assert_ne!(first, second);
    }
}
