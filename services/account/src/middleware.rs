//! Middleware for access-token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// Authenticated user identity established from a verified access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Extract and validate the access token from the `accessToken` cookie or
/// the Authorization header, and insert the authenticated identity into the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Cookie first, then bearer header
    let token = if let Some(cookie) = jar.get("accessToken") {
        cookie.value().to_string()
    } else {
        req.headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|token| token.to_string())
            .ok_or_else(|| AppError::Auth("Unauthorized request".to_string()))?
    };

    let claims = state
        .jwt_service
        .verify_access_token(&token)
        .map_err(|_| AppError::Auth("Invalid access token".to_string()))?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
