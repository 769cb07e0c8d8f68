//! Calendar access check

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use tracing::{error, warn};

use crate::{
    error::{ApiError, DatabaseResultExt},
    middleware::auth::AuthUser,
    models::Calendar,
    state::AppState,
};

/// Let the caller through only when the resolved calendar is shared with them
///
/// Runs after [`super::auth_middleware`] and [`super::require_calendar`].
pub async fn calendar_access_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|auth| auth.user.user_id)
        .ok_or(ApiError::UserNotAuthenticated)?;

    let Some(calendar_id) = req.extensions().get::<Calendar>().map(|c| c.calendar_id) else {
        error!("Calendar access check without a resolved calendar");
        return Err(ApiError::Internal);
    };

    state
        .calendar_repository
        .user_has_access(user_id, calendar_id)
        .await
        .not_found_or(ApiError::NoAccessToCalendar, ApiError::CalendarAccessCheck)
        .inspect_err(|e| {
            if *e == ApiError::NoAccessToCalendar {
                warn!("User {} denied access to calendar {}", user_id, calendar_id);
            }
        })?;

    Ok(next.run(req).await)
}
