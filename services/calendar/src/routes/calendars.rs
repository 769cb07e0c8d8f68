//! Calendar routes

use axum::{
    Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::{
    error::{ApiError, ApiResult, DatabaseResultExt},
    extract::{JsonBody, Resolved},
    middleware::{
        AuthUser, PathParam, auth_middleware, calendar_access_middleware, require_calendar,
    },
    models::{Calendar, CalendarChanges, CreateCalendarRequest, CreateCalendarResponse},
    response::{ApiResponse, created},
    state::AppState,
    validation::require_non_empty,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let by_id = Router::new()
        .route(
            "/calendar/:calendar_id",
            get(get_calendar)
                .put(update_calendar)
                .delete(delete_calendar),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn_with_state(
                    PathParam::new(state, "calendar_id"),
                    require_calendar,
                ))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    calendar_access_middleware,
                )),
        );

    Router::new()
        .route("/calendar", post(create_calendar).get(list_calendars))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .merge(by_id)
}

/// Create a calendar shared with its creator
pub async fn create_calendar(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<CreateCalendarRequest>,
) -> ApiResult<impl IntoResponse> {
    require_non_empty("title", &payload.title)?;

    let user_id = auth.user.user_id;
    let calendar_id = state
        .calendar_repository
        .create_for_user(
            user_id,
            &payload.title,
            payload.description.as_deref(),
            state.now(),
        )
        .await
        .or_api_error(ApiError::CalendarCreation)?;

    Ok(created(CreateCalendarResponse {
        calendar_id,
        user_id,
    }))
}

/// Calendars the caller has access to
pub async fn list_calendars(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let calendars = state
        .calendar_repository
        .list_for_user(auth.user.user_id)
        .await
        .or_api_error(ApiError::Internal)?;

    Ok(ApiResponse::data(calendars))
}

pub async fn get_calendar(Resolved(calendar): Resolved<Calendar>) -> impl IntoResponse {
    ApiResponse::data(calendar)
}

pub async fn update_calendar(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
    JsonBody(changes): JsonBody<CalendarChanges>,
) -> ApiResult<impl IntoResponse> {
    if let Some(title) = &changes.title {
        require_non_empty("title", title)?;
    }

    let calendar = state
        .calendar_repository
        .update(calendar.calendar_id, &changes, state.now())
        .await
        .not_found_or(ApiError::CalendarNotFound, ApiError::CalendarUpdate)?;

    Ok(ApiResponse::data(calendar).with_message("Calendar updated"))
}

/// Delete a calendar with its events and sharing links
pub async fn delete_calendar(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
) -> ApiResult<impl IntoResponse> {
    state
        .calendar_repository
        .delete(calendar.calendar_id, state.now())
        .await
        .not_found_or(ApiError::CalendarNotFound, ApiError::CalendarDelete)?;

    Ok(ApiResponse::message("Calendar deleted"))
}
