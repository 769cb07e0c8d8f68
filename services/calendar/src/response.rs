//! Uniform JSON envelope for every response
//!
//! ```json
//! { "success": bool, "message"?: str, "data"?: any, "error"?: str }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    /// Attach a human readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Successful response carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// Failed response with the error identifier and its message
    pub fn failure(kind: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: Some(kind.to_string()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// `201 Created` with `data`
pub fn created<T: Serialize>(data: T) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::CREATED, ApiResponse::data(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_envelope() {
        let body = serde_json::to_value(ApiResponse::data(json!({"calendar_id": 3}))).unwrap();
        assert_eq!(body, json!({"success": true, "data": {"calendar_id": 3}}));
    }

    #[test]
    fn test_message_envelope() {
        let body = serde_json::to_value(ApiResponse::message("Logged out")).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Logged out"}));
    }

    #[test]
    fn test_failure_envelope() {
        let body =
            serde_json::to_value(ApiResponse::failure("CalendarNotFound", "Calendar not found"))
                .unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Calendar not found",
                "error": "CalendarNotFound"
            })
        );
    }

    #[test]
    fn test_created_status() {
        let (status, body) = created(json!({"event_id": 1}));
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
    }
}
