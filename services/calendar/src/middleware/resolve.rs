//! Path parameter resolvers
//!
//! Each resolver parses one path parameter, loads the live entity it names
//! and stashes it in the request extensions for the handler.

use axum::{
    extract::{Path, Request, State, rejection::PathRejection},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use tracing::error;

use crate::{
    error::{ApiError, ApiResult, DatabaseResultExt},
    models::Calendar,
    state::AppState,
};

type PathParams = Result<Path<HashMap<String, String>>, PathRejection>;

/// Middleware state naming the path parameter a resolver reads
#[derive(Clone)]
pub struct PathParam {
    pub state: AppState,
    pub name: &'static str,
}

impl PathParam {
    pub fn new(state: &AppState, name: &'static str) -> Self {
        Self {
            state: state.clone(),
            name,
        }
    }

    fn parse(&self, params: PathParams, invalid: ApiError) -> ApiResult<i64> {
        let Path(params) = params.map_err(|e| {
            error!("Failed to read path parameters: {}", e);
            ApiError::Internal
        })?;

        let Some(raw) = params.get(self.name) else {
            error!("Route has no path parameter named {}", self.name);
            return Err(ApiError::Internal);
        };

        raw.parse().map_err(|_| invalid)
    }
}

/// Load the live user named by the parameter
pub async fn require_user(
    State(param): State<PathParam>,
    params: PathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = param.parse(params, ApiError::InvalidUserId)?;

    let user = param
        .state
        .user_repository
        .find_by_id(user_id)
        .await
        .not_found_or(ApiError::UserNotFound, ApiError::UserVerification)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Load the live calendar named by the parameter
pub async fn require_calendar(
    State(param): State<PathParam>,
    params: PathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let calendar_id = param.parse(params, ApiError::InvalidCalendarId)?;

    let calendar = param
        .state
        .calendar_repository
        .find_by_id(calendar_id)
        .await
        .not_found_or(ApiError::CalendarNotFound, ApiError::CalendarVerification)?;

    req.extensions_mut().insert(calendar);
    Ok(next.run(req).await)
}

/// Load the live event named by the parameter
///
/// Layered under `require_calendar`; the event must be linked to that calendar.
pub async fn require_event(
    State(param): State<PathParam>,
    params: PathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let event_id = param.parse(params, ApiError::InvalidEventId)?;

    let Some(calendar_id) = req.extensions().get::<Calendar>().map(|c| c.calendar_id) else {
        error!("Event {} requested without a resolved calendar", event_id);
        return Err(ApiError::Internal);
    };

    let event = param
        .state
        .event_repository
        .find_in_calendar(calendar_id, event_id)
        .await
        .not_found_or(ApiError::EventNotFound, ApiError::EventVerification)?;

    req.extensions_mut().insert(event);
    Ok(next.run(req).await)
}
