//! Uniform success envelope

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope returned by every endpoint:
/// `{statusCode, data, message, success: true}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload in the success envelope
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ApiResponse::new(
            StatusCode::CREATED,
            json!({"id": 1}),
            "User registered successfully",
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["statusCode"], 201);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "User registered successfully");
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn test_envelope_status_drives_http_status() {
        let envelope = ApiResponse::new(StatusCode::CREATED, json!({}), "created");
        let response = envelope.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
