//! User model and request/response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity as stored in the `users` table.
///
/// Carries the password hash and the currently active refresh token, so it
/// is never serialized into a response directly; handlers convert to
/// [`UserResponse`] first.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload. The password is plain text here; hashing is
/// the repository's responsibility.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

/// Sanitized user projection returned by every user-facing operation.
///
/// Has no password or refresh-token field by construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar_url,
            cover_image: user.cover_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request for user login. Either `username` or `email` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Request for token refresh when the token is sent in the body instead of
/// the `refreshToken` cookie.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Request for password change
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Request for profile update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: String,
    pub email: String,
}

/// Login response payload: the sanitized user plus the freshly minted pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Rotated token pair returned by the refresh endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Doe".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".to_string(),
            avatar_url: "https://media.example.com/images/a.png".to_string(),
            cover_image_url: None,
            refresh_token: Some("token".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_omits_credentials() {
        let response = UserResponse::from(sample_user());
        let json = serde_json::to_value(&response).unwrap();

        let object = json.as_object().unwrap();
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("refreshToken"));
        assert_eq!(json["username"], "alice");
        assert_eq!(json["fullName"], "Alice Doe");
    }

    #[test]
    fn test_request_payloads_use_camel_case() {
        let change: ChangePasswordRequest = serde_json::from_str(
            r#"{"oldPassword": "old-secret", "newPassword": "new-secret"}"#,
        )
        .unwrap();
        assert_eq!(change.old_password, "old-secret");

        let refresh: RefreshRequest = serde_json::from_str(r#"{"refreshToken": "abc"}"#).unwrap();
        assert_eq!(refresh.refresh_token.as_deref(), Some("abc"));

        let update: UpdateAccountRequest =
            serde_json::from_str(r#"{"fullName": "Alice B", "email": "b@example.com"}"#).unwrap();
        assert_eq!(update.full_name, "Alice B");
    }
}
