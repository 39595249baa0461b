//! JWT service for access and refresh token issuance and verification
//!
//! Access and refresh tokens are signed with separate secrets and carry
//! separate claim sets: a leaked access token cannot be used to mint new
//! sessions, and a refresh token never passes access-token verification.
//! Access tokens are stateless; refresh tokens are additionally compared
//! against the value persisted on the user record by the caller.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing and verifying access tokens
    pub access_token_secret: String,
    /// Secret for signing and verifying refresh tokens
    pub refresh_token_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 10 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: secret for access tokens (required)
    /// - `REFRESH_TOKEN_SECRET`: secret for refresh tokens (required)
    /// - `ACCESS_TOKEN_EXPIRY`: access token expiry in seconds (default: 900)
    /// - `REFRESH_TOKEN_EXPIRY`: refresh token expiry in seconds (default: 864000)
    pub fn from_env() -> Result<Self> {
        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;

        let refresh_token_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "864000".to_string()) // 10 days
            .parse()
            .unwrap_or(864000);

        Ok(JwtConfig {
            access_token_secret,
            refresh_token_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Claims carried by a refresh token. Identity only.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let access_encoding_key = EncodingKey::from_secret(config.access_token_secret.as_bytes());
        let access_decoding_key = DecodingKey::from_secret(config.access_token_secret.as_bytes());
        let refresh_encoding_key = EncodingKey::from_secret(config.refresh_token_secret.as_bytes());
        let refresh_decoding_key = DecodingKey::from_secret(config.refresh_token_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            access_encoding_key,
            access_decoding_key,
            refresh_encoding_key,
            refresh_decoding_key,
            validation,
            config,
        }
    }

    /// Generate an access token for a user
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = unix_now()?;

        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now + self.config.access_token_expiry,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.access_encoding_key,
        )?;
        Ok(token)
    }

    /// Generate a refresh token for a user
    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let now = unix_now()?;

        let claims = RefreshClaims {
            sub: user.id,
            iat: now,
            exp: now + self.config.refresh_token_expiry,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.refresh_encoding_key,
        )?;
        Ok(token)
    }

    /// Validate an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let token_data =
            decode::<AccessClaims>(token, &self.access_decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a refresh token's signature and expiry and return its claims.
    ///
    /// This alone does not authorize a refresh; the caller must also compare
    /// the token against the value persisted on the user record.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        let token_data =
            decode::<RefreshClaims>(token, &self.refresh_decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

}

fn unix_now() -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs();
    Ok(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;

    fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            access_token_secret: "test-access-secret".to_string(),
            refresh_token_secret: "test-refresh-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 864000,
        })
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Doe".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: "https://media.example.com/images/a.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = test_service();
        let user = sample_user();

        let token = service.issue_access_token(&user).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.full_name, user.full_name);
        assert_eq!(claims.exp, claims.iat + 900);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let service = test_service();
        let user = sample_user();

        let token = service.issue_refresh_token(&user).unwrap();
        let claims = service.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.exp, claims.iat + 864000);
    }

    #[test]
    fn test_tokens_do_not_cross_verify() {
        let service = test_service();
        let user = sample_user();

        let access = service.issue_access_token(&user).unwrap();
        let refresh = service.issue_refresh_token(&user).unwrap();

        assert!(service.verify_refresh_token(&access).is_err());
        assert!(service.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = test_service();
        let user = sample_user();

        let mut token = service.issue_refresh_token(&user).unwrap();
        token.push('x');

        assert!(service.verify_refresh_token(&token).is_err());
    }

    #[test]
    fn test_expired_refresh_token_is_rejected() {
        let service = test_service();
        let user = sample_user();
        let now = unix_now().unwrap();

        // Past the default validation leeway
        let claims = RefreshClaims {
            sub: user.id,
            iat: now.saturating_sub(7200),
            exp: now.saturating_sub(3600),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test-refresh-secret".as_bytes()),
        )
        .unwrap();

        assert!(service.verify_refresh_token(&token).is_err());
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env() {
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "a-secret");
            std::env::set_var("REFRESH_TOKEN_SECRET", "r-secret");
            std::env::remove_var("ACCESS_TOKEN_EXPIRY");
            std::env::remove_var("REFRESH_TOKEN_EXPIRY");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.access_token_secret, "a-secret");
        assert_eq!(config.refresh_token_secret, "r-secret");
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 864000);

        unsafe {
            std::env::remove_var("ACCESS_TOKEN_SECRET");
            std::env::remove_var("REFRESH_TOKEN_SECRET");
        }
    }

    #[test]
    #[serial]
    fn test_jwt_config_requires_secrets() {
        unsafe {
            std::env::remove_var("ACCESS_TOKEN_SECRET");
            std::env::remove_var("REFRESH_TOKEN_SECRET");
        }

        assert!(JwtConfig::from_env().is_err());
    }
}
