//! Custom error types for the calendar service
//!
//! Every failure a handler can report is an [`ApiError`] variant. Each variant
//! carries a stable identifier (sent in the `error` field of the response
//! envelope) and an HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, DatabaseResult};
use thiserror::Error;
use tracing::error;

use crate::response::ApiResponse;

/// Custom error type for the calendar service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // Client input
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid user ID")]
    InvalidUserId,
    #[error("Invalid calendar ID")]
    InvalidCalendarId,
    #[error("Invalid event ID")]
    InvalidEventId,
    #[error("Invalid year")]
    InvalidYear,
    #[error("Invalid month, expected a value between 1 and 12")]
    InvalidMonth,
    #[error("Invalid day, expected a valid day of the month")]
    InvalidDay,
    #[error("Invalid week number, expected a value between 1 and 53")]
    InvalidWeekNumber,
    #[error("Invalid duration, expected at least one minute")]
    InvalidDuration,
    #[error("Invalid email format")]
    InvalidEmailFormat,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    /// The `Authorization` header of a logout request is not a bearer token
    #[error("Invalid session")]
    MalformedBearer,

    // Authentication
    #[error("User not authenticated")]
    UserNotAuthenticated,
    #[error("Invalid session")]
    SessionInvalid,
    #[error("Session expired")]
    SessionExpired,
    #[error("Invalid email or password")]
    InvalidCredentials,

    // Authorization
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("No access to this calendar")]
    NoAccessToCalendar,

    // Not found
    #[error("User not found")]
    UserNotFound,
    #[error("Calendar not found")]
    CalendarNotFound,
    #[error("Event not found")]
    EventNotFound,
    #[error("Role not found")]
    RoleNotFound,
    #[error("Role assignment not found")]
    UserRoleNotFound,
    #[error("Session not found")]
    SessionNotFound,
    #[error("User calendar link not found")]
    UserCalendarNotFound,

    // Conflict
    #[error("A user with this email already exists")]
    UserAlreadyExists,
    #[error("A role with this name already exists")]
    RoleAlreadyExists,
    #[error("Role already assigned to this user")]
    RoleAlreadyAssigned,
    #[error("User already has access to this calendar")]
    UserCalendarAlreadyExists,

    // Internal
    #[error("Failed to start transaction")]
    TransactionStart,
    #[error("Failed to commit transaction")]
    TransactionCommit,
    #[error("Failed to verify user")]
    UserVerification,
    #[error("Failed to verify calendar")]
    CalendarVerification,
    #[error("Failed to verify event")]
    EventVerification,
    #[error("Failed to check calendar access")]
    CalendarAccessCheck,
    #[error("Failed to create user")]
    UserCreation,
    #[error("Failed to update user")]
    UserUpdate,
    #[error("Failed to delete user")]
    UserDelete,
    #[error("Failed to create calendar")]
    CalendarCreation,
    #[error("Failed to update calendar")]
    CalendarUpdate,
    #[error("Failed to delete calendar")]
    CalendarDelete,
    #[error("Failed to create event")]
    EventCreation,
    #[error("Failed to update event")]
    EventUpdate,
    #[error("Failed to delete event")]
    EventDelete,
    #[error("Failed to create role")]
    RoleCreation,
    #[error("Failed to update role")]
    RoleUpdate,
    #[error("Failed to delete role")]
    RoleDelete,
    #[error("Failed to assign role")]
    RoleAssignment,
    #[error("Failed to revoke role")]
    RoleRevocation,
    #[error("Failed to create user calendar link")]
    UserCalendarCreation,
    #[error("Failed to update user calendar link")]
    UserCalendarUpdate,
    #[error("Failed to delete user calendar link")]
    UserCalendarDelete,
    #[error("Failed to create session")]
    SessionCreation,
    #[error("Failed to update session")]
    SessionUpdate,
    #[error("Failed to delete session")]
    SessionDelete,
    #[error("Failed to hash password")]
    PasswordHashing,
    #[error("Failed to generate token")]
    TokenGeneration,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Stable identifier sent to clients in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidData(_) => "InvalidData",
            Self::InvalidUserId => "InvalidUserID",
            Self::InvalidCalendarId => "InvalidCalendarID",
            Self::InvalidEventId => "InvalidEventID",
            Self::InvalidYear => "InvalidYear",
            Self::InvalidMonth => "InvalidMonth",
            Self::InvalidDay => "InvalidDay",
            Self::InvalidWeekNumber => "InvalidWeekNumber",
            Self::InvalidDuration => "InvalidDuration",
            Self::InvalidEmailFormat => "InvalidEmailFormat",
            Self::PasswordTooShort => "PasswordTooShort",
            Self::MalformedBearer | Self::SessionInvalid => "SessionInvalid",
            Self::UserNotAuthenticated => "UserNotAuthenticated",
            Self::SessionExpired => "SessionExpired",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::InsufficientPermissions => "InsufficientPermissions",
            Self::NoAccessToCalendar => "NoAccessToCalendar",
            Self::UserNotFound => "UserNotFound",
            Self::CalendarNotFound => "CalendarNotFound",
            Self::EventNotFound => "EventNotFound",
            Self::RoleNotFound => "RoleNotFound",
            Self::UserRoleNotFound => "UserRoleNotFound",
            Self::SessionNotFound => "SessionNotFound",
            Self::UserCalendarNotFound => "UserCalendarNotFound",
            Self::UserAlreadyExists => "UserAlreadyExists",
            Self::RoleAlreadyExists => "RoleAlreadyExists",
            Self::RoleAlreadyAssigned => "RoleAlreadyAssigned",
            Self::UserCalendarAlreadyExists => "UserCalendarAlreadyExists",
            Self::TransactionStart => "TransactionStart",
            Self::TransactionCommit => "TransactionCommit",
            Self::UserVerification => "UserVerification",
            Self::CalendarVerification => "CalendarVerification",
            Self::EventVerification => "EventVerification",
            Self::CalendarAccessCheck => "CalendarAccessCheck",
            Self::UserCreation => "UserCreation",
            Self::UserUpdate => "UserUpdate",
            Self::UserDelete => "UserDelete",
            Self::CalendarCreation => "CalendarCreation",
            Self::CalendarUpdate => "CalendarUpdate",
            Self::CalendarDelete => "CalendarDelete",
            Self::EventCreation => "EventCreation",
            Self::EventUpdate => "EventUpdate",
            Self::EventDelete => "EventDelete",
            Self::RoleCreation => "RoleCreation",
            Self::RoleUpdate => "RoleUpdate",
            Self::RoleDelete => "RoleDelete",
            Self::RoleAssignment => "RoleAssignment",
            Self::RoleRevocation => "RoleRevocation",
            Self::UserCalendarCreation => "UserCalendarCreation",
            Self::UserCalendarUpdate => "UserCalendarUpdate",
            Self::UserCalendarDelete => "UserCalendarDelete",
            Self::SessionCreation => "SessionCreation",
            Self::SessionUpdate => "SessionUpdate",
            Self::SessionDelete => "SessionDelete",
            Self::PasswordHashing => "PasswordHashing",
            Self::TokenGeneration => "TokenGeneration",
            Self::Internal => "Internal",
        }
    }

    /// HTTP status the error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidData(_)
            | Self::InvalidUserId
            | Self::InvalidCalendarId
            | Self::InvalidEventId
            | Self::InvalidYear
            | Self::InvalidMonth
            | Self::InvalidDay
            | Self::InvalidWeekNumber
            | Self::InvalidDuration
            | Self::InvalidEmailFormat
            | Self::PasswordTooShort
            | Self::MalformedBearer => StatusCode::BAD_REQUEST,

            Self::UserNotAuthenticated
            | Self::SessionInvalid
            | Self::SessionExpired
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::InsufficientPermissions | Self::NoAccessToCalendar => StatusCode::FORBIDDEN,

            Self::UserNotFound
            | Self::CalendarNotFound
            | Self::EventNotFound
            | Self::RoleNotFound
            | Self::UserRoleNotFound
            | Self::SessionNotFound
            | Self::UserCalendarNotFound => StatusCode::NOT_FOUND,

            Self::UserAlreadyExists
            | Self::RoleAlreadyExists
            | Self::RoleAlreadyAssigned
            | Self::UserCalendarAlreadyExists => StatusCode::CONFLICT,

            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::failure(self.kind(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        triage(err, None, None, ApiError::Internal)
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// Map a database failure onto the error reported to the client.
///
/// `RowNotFound` becomes `not_found` and unique-index violations become
/// `conflict` when those are given. Transaction start/commit failures keep
/// their own kinds. Anything else is logged and reported as `other`.
pub fn triage(
    err: DatabaseError,
    not_found: Option<ApiError>,
    conflict: Option<ApiError>,
    other: ApiError,
) -> ApiError {
    if err.is_not_found() {
        if let Some(not_found) = not_found {
            return not_found;
        }
    }

    if err.is_unique_violation() {
        if let Some(conflict) = conflict {
            return conflict;
        }
    }

    match err {
        DatabaseError::TransactionStart(e) => {
            error!("Failed to start transaction: {}", e);
            ApiError::TransactionStart
        }
        DatabaseError::TransactionCommit(e) => {
            error!("Failed to commit transaction: {}", e);
            ApiError::TransactionCommit
        }
        e => {
            error!("{}: {}", other.kind(), e);
            other
        }
    }
}

/// Helper trait to reduce boilerplate when mapping database results
pub trait DatabaseResultExt<T> {
    /// Any failure becomes `error`
    fn or_api_error(self, error: ApiError) -> ApiResult<T>;

    /// A missing row becomes `not_found`, anything else `error`
    fn not_found_or(self, not_found: ApiError, error: ApiError) -> ApiResult<T>;

    /// A unique-index violation becomes `conflict`, anything else `error`
    fn conflict_or(self, conflict: ApiError, error: ApiError) -> ApiResult<T>;
}

impl<T> DatabaseResultExt<T> for DatabaseResult<T> {
    fn or_api_error(self, error: ApiError) -> ApiResult<T> {
        self.map_err(|e| triage(e, None, None, error))
    }

    fn not_found_or(self, not_found: ApiError, error: ApiError) -> ApiResult<T> {
        self.map_err(|e| triage(e, Some(not_found), None, error))
    }

    fn conflict_or(self, conflict: ApiError, error: ApiError) -> ApiResult<T> {
        self.map_err(|e| triage(e, None, Some(conflict), error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_by_category() {
        assert_eq!(ApiError::InvalidMonth.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::SessionExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NoAccessToCalendar.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::RoleNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::RoleAlreadyAssigned.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::TransactionCommit.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_bearer_is_a_bad_request_session_invalid() {
        assert_eq!(ApiError::MalformedBearer.kind(), "SessionInvalid");
        assert_eq!(ApiError::MalformedBearer.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::SessionInvalid.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_identifier_spelling() {
        assert_eq!(ApiError::InvalidCalendarId.kind(), "InvalidCalendarID");
        assert_eq!(ApiError::InvalidUserId.kind(), "InvalidUserID");
        assert_eq!(ApiError::InvalidEventId.kind(), "InvalidEventID");
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, body) = body_of(ApiError::CalendarNotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "CalendarNotFound");
        assert_eq!(body["message"], "Calendar not found");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_triage_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        let mapped = triage(
            err,
            Some(ApiError::UserNotFound),
            None,
            ApiError::UserVerification,
        );
        assert_eq!(mapped, ApiError::UserNotFound);
    }

    #[test]
    fn test_triage_other_error() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        let mapped = triage(
            err,
            Some(ApiError::UserNotFound),
            None,
            ApiError::UserVerification,
        );
        assert_eq!(mapped, ApiError::UserVerification);
    }

    #[test]
    fn test_triage_keeps_transaction_kinds() {
        let start = DatabaseError::TransactionStart(sqlx::Error::PoolTimedOut);
        let commit = DatabaseError::TransactionCommit(sqlx::Error::PoolClosed);

        assert_eq!(
            triage(start, None, None, ApiError::CalendarCreation),
            ApiError::TransactionStart
        );
        assert_eq!(
            triage(commit, None, None, ApiError::CalendarCreation),
            ApiError::TransactionCommit
        );
    }

    #[test]
    fn test_row_not_found_without_mapping_is_the_fallback() {
        let result: DatabaseResult<()> = Err(sqlx::Error::RowNotFound.into());
        assert_eq!(
            result.or_api_error(ApiError::EventUpdate),
            Err(ApiError::EventUpdate)
        );
    }
}
