//! Account service routes
//!
//! Handlers parse and validate the request, orchestrate the repositories,
//! token service, and media store, and wrap results in the uniform
//! envelope. Uploaded files are staged to the local upload directory by
//! the transport before the media store sees them.

use std::path::{Path as FsPath, PathBuf};

use anyhow::anyhow;
use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State, multipart::Field},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::{AuthUser, auth_middleware},
    models::{
        AuthPayload, ChangePasswordRequest, LoginRequest, NewUser, RefreshRequest, TokenPair,
        UpdateAccountRequest, UserResponse,
    },
    response::ApiResponse,
    state::AppState,
    validation::{require_field, validate_email, validate_password, validate_username},
};

/// Create the router for the account service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/logout", post(logout))
        .route("/api/v1/users/change-password", post(change_password))
        .route("/api/v1/users/current-user", get(current_user))
        .route("/api/v1/users/update-account", patch(update_account))
        .route("/api/v1/users/avatar", patch(update_avatar))
        .route("/api/v1/users/cover-image", patch(update_cover_image))
        .route("/api/v1/users/c/:username", get(channel_profile))
        .route("/api/v1/users/history", get(watch_history))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/refresh-token", post(refresh_token))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "account-service",
        "database": database,
    }))
}

/// Register a new user from a multipart form: text fields plus a required
/// `avatar` file and an optional `coverImage` file.
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    info!("Registration attempt");

    let mut full_name = None;
    let mut email = None;
    let mut username = None;
    let mut password = None;
    let mut avatar_path: Option<PathBuf> = None;
    let mut cover_image_path: Option<PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "fullName" => full_name = Some(read_text(field).await?),
            "email" => email = Some(read_text(field).await?),
            "username" => username = Some(read_text(field).await?),
            "password" => password = Some(read_text(field).await?),
            "avatar" => avatar_path = Some(stage_file(field, &state.upload_dir).await?),
            "coverImage" => cover_image_path = Some(stage_file(field, &state.upload_dir).await?),
            _ => {} // ignore unknown fields
        }
    }

    let full_name = require_field(full_name.as_deref().unwrap_or(""), "Full name")
        .map_err(AppError::Validation)?;
    let email =
        require_field(email.as_deref().unwrap_or(""), "Email").map_err(AppError::Validation)?;
    let username = require_field(username.as_deref().unwrap_or(""), "Username")
        .map_err(AppError::Validation)?;
    let password = require_field(password.as_deref().unwrap_or(""), "Password")
        .map_err(AppError::Validation)?;

    validate_username(&username).map_err(AppError::Validation)?;
    validate_email(&email).map_err(AppError::Validation)?;
    validate_password(&password).map_err(AppError::Validation)?;

    let username = username.to_lowercase();

    let avatar_path = avatar_path
        .ok_or_else(|| AppError::Validation("Avatar file is required".to_string()))?;

    if state
        .user_repository
        .exists_by_username_or_email(&username, &email)
        .await?
    {
        return Err(AppError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let avatar_result = state.media_storage.upload_image(&avatar_path).await;
    discard_staged(&avatar_path).await;
    let avatar_url = match avatar_result {
        Ok(url) => url,
        Err(e) => {
            if let Some(path) = &cover_image_path {
                discard_staged(path).await;
            }
            return Err(AppError::Upload(format!("Failed to upload avatar: {}", e)));
        }
    };

    // A failed cover upload does not abort registration; the cover slot is
    // optional and simply stays empty
    let cover_image_url = match &cover_image_path {
        Some(path) => {
            let result = state.media_storage.upload_image(path).await;
            discard_staged(path).await;
            match result {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Failed to upload cover image: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let user = state
        .user_repository
        .create(&NewUser {
            username,
            email,
            full_name,
            password,
            avatar_url,
            cover_image_url,
        })
        .await?;

    info!("User registered: {}", user.username);

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        UserResponse::from(user),
        "User registered successfully",
    ))
}

/// User login endpoint. Accepts a username or an email as the identifier,
/// mints a fresh token pair, and persists the refresh token.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identifier = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            payload
                .email
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .ok_or_else(|| AppError::Validation("Username or email is required".to_string()))?;

    info!("Login attempt for: {}", identifier);

    let user = state
        .user_repository
        .find_by_username_or_email(identifier)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    if !state
        .user_repository
        .verify_password(&user, &payload.password)?
    {
        return Err(AppError::Auth("Invalid user credentials".to_string()));
    }

    let access_token = state.jwt_service.issue_access_token(&user)?;
    let refresh_token = state.jwt_service.issue_refresh_token(&user)?;

    // Overwrites any prior value: a single refresh lineage per user
    state
        .user_repository
        .set_refresh_token(user.id, Some(&refresh_token))
        .await?;

    info!("User logged in: {}", user.username);

    let jar = jar
        .add(auth_cookie("accessToken", access_token.clone()))
        .add(auth_cookie("refreshToken", refresh_token.clone()));

    let auth_payload = AuthPayload {
        user: UserResponse::from(user),
        access_token,
        refresh_token,
    };

    Ok((
        jar,
        ApiResponse::new(StatusCode::OK, auth_payload, "User logged in successfully"),
    ))
}

/// Exchange a valid refresh token for a freshly rotated token pair.
///
/// The incoming token must signature-verify and byte-match the value
/// persisted on the user record; a rotated-out token fails even when it
/// has not yet expired. Unexpected failures in this flow surface as auth
/// failures carrying the underlying message.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    info!("Token refresh request");

    let incoming = jar
        .get("refreshToken")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(payload)| payload.refresh_token))
        .ok_or_else(|| AppError::Auth("Unauthorized request".to_string()))?;

    let claims = state
        .jwt_service
        .verify_refresh_token(&incoming)
        .map_err(|_| AppError::Auth("Invalid refresh token".to_string()))?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AppError::Auth(e.to_string()))?
        .ok_or_else(|| AppError::Auth("Invalid refresh token".to_string()))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        return Err(AppError::Auth(
            "Refresh token is expired or used".to_string(),
        ));
    }

    let access_token = state
        .jwt_service
        .issue_access_token(&user)
        .map_err(|e| AppError::Auth(e.to_string()))?;
    let new_refresh_token = state
        .jwt_service
        .issue_refresh_token(&user)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    state
        .user_repository
        .set_refresh_token(user.id, Some(&new_refresh_token))
        .await
        .map_err(|e| AppError::Auth(e.to_string()))?;

    info!("Tokens rotated for user: {}", user.username);

    let jar = jar
        .add(auth_cookie("accessToken", access_token.clone()))
        .add(auth_cookie("refreshToken", new_refresh_token.clone()));

    let pair = TokenPair {
        access_token,
        refresh_token: new_refresh_token,
    };

    Ok((
        jar,
        ApiResponse::new(StatusCode::OK, pair, "Access token refreshed"),
    ))
}

/// Logout endpoint: clears the persisted refresh token and both cookies
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state
        .user_repository
        .set_refresh_token(auth_user.id, None)
        .await?;

    info!("User logged out: {}", auth_user.username);

    let jar = jar
        .remove(removal_cookie("accessToken"))
        .remove(removal_cookie("refreshToken"));

    Ok((
        jar,
        ApiResponse::new(StatusCode::OK, json!({}), "User logged out"),
    ))
}

/// Change the authenticated user's password after verifying the old one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let old_password =
        require_field(&payload.old_password, "Old password").map_err(AppError::Validation)?;
    let new_password =
        require_field(&payload.new_password, "New password").map_err(AppError::Validation)?;
    validate_password(&new_password).map_err(AppError::Validation)?;

    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !state.user_repository.verify_password(&user, &old_password)? {
        return Err(AppError::Auth("Invalid old password".to_string()));
    }

    state
        .user_repository
        .update_password(user.id, &new_password)
        .await?;

    info!("Password changed for user: {}", user.username);

    Ok(ApiResponse::new(
        StatusCode::OK,
        json!({}),
        "Password changed successfully",
    ))
}

/// Return the authenticated user's sanitized record
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        UserResponse::from(user),
        "Current user fetched successfully",
    ))
}

/// Replace the authenticated user's display name and email
pub async fn update_account(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let full_name =
        require_field(&payload.full_name, "Full name").map_err(AppError::Validation)?;
    let email = require_field(&payload.email, "Email").map_err(AppError::Validation)?;
    validate_email(&email).map_err(AppError::Validation)?;

    let user = state
        .user_repository
        .update_profile(auth_user.id, &full_name, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!("Account details updated for user: {}", user.username);

    Ok(ApiResponse::new(
        StatusCode::OK,
        UserResponse::from(user),
        "Account details updated successfully",
    ))
}

/// Replace the authenticated user's avatar with a freshly uploaded file
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let staged = stage_single_file(multipart, "avatar", "Avatar", &state.upload_dir).await?;

    let result = state.media_storage.upload_image(&staged).await;
    discard_staged(&staged).await;
    let avatar_url =
        result.map_err(|e| AppError::Upload(format!("Failed to upload avatar: {}", e)))?;

    let user = state
        .user_repository
        .update_avatar(auth_user.id, &avatar_url)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!("Avatar updated for user: {}", user.username);

    Ok(ApiResponse::new(
        StatusCode::OK,
        UserResponse::from(user),
        "Avatar updated successfully",
    ))
}

/// Replace the authenticated user's cover image with a freshly uploaded file
pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let staged =
        stage_single_file(multipart, "coverImage", "Cover image", &state.upload_dir).await?;

    let result = state.media_storage.upload_image(&staged).await;
    discard_staged(&staged).await;
    let cover_image_url =
        result.map_err(|e| AppError::Upload(format!("Failed to upload cover image: {}", e)))?;

    let user = state
        .user_repository
        .update_cover_image(auth_user.id, &cover_image_url)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!("Cover image updated for user: {}", user.username);

    Ok(ApiResponse::new(
        StatusCode::OK,
        UserResponse::from(user),
        "Cover image updated successfully",
    ))
}

/// Read-time channel summary for a username
pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let username = require_field(&username, "Username").map_err(AppError::Validation)?;

    let profile = state
        .channel_repository
        .channel_profile(&username.to_lowercase(), auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        profile,
        "Channel profile fetched successfully",
    ))
}

/// The authenticated user's watch history in viewing order
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.channel_repository.watch_history(auth_user.id).await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        history,
        "Watch history fetched successfully",
    ))
}

/// Cookie carrying a bearer token: HTTP-only and secure-transport-only
fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Write an uploaded field into the staging directory and return its path
async fn stage_file(field: Field<'_>, upload_dir: &FsPath) -> AppResult<PathBuf> {
    let original = field.file_name().unwrap_or("upload.bin").to_string();
    // Keep only the final path component of the client-supplied name
    let original = FsPath::new(&original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(anyhow!("Failed to create upload directory: {}", e)))?;

    let staged = upload_dir.join(format!("{}-{}", Uuid::new_v4(), original));
    tokio::fs::write(&staged, &data)
        .await
        .map_err(|e| AppError::Internal(anyhow!("Failed to stage upload: {}", e)))?;

    Ok(staged)
}

/// Stage exactly one named file field from a multipart request
async fn stage_single_file(
    mut multipart: Multipart,
    field_name: &str,
    display_name: &str,
    upload_dir: &FsPath,
) -> AppResult<PathBuf> {
    let mut staged = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some(field_name) {
            staged = Some(stage_file(field, upload_dir).await?);
        }
    }

    staged.ok_or_else(|| AppError::Validation(format!("{} file is required", display_name)))
}

/// Best-effort removal of a staged upload
async fn discard_staged(path: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove staged file {}: {}", path.display(), e);
    }
}
