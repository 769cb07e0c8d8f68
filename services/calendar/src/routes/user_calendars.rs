//! Calendar sharing routes, admin only

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
    middleware::{PathParam, admin_middleware, auth_middleware, require_calendar, require_user},
    models::{Calendar, CreateUserCalendarRequest, User},
    response::{ApiResponse, created},
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let by_user = Router::new()
        .route("/user-calendar/:user_id", get(list_user_calendars))
        .route_layer(middleware::from_fn_with_state(
            PathParam::new(state, "user_id"),
            require_user,
        ));

    let by_pair = Router::new()
        .route(
            "/user-calendar/:user_id/:calendar_id",
            get(get_user_calendar)
                .put(touch_user_calendar)
                .delete(delete_user_calendar),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    PathParam::new(state, "user_id"),
                    require_user,
                ))
                .layer(middleware::from_fn_with_state(
                    PathParam::new(state, "calendar_id"),
                    require_calendar,
                )),
        );

    Router::new()
        .route("/user-calendar", post(create_user_calendar))
        .merge(by_user)
        .merge(by_pair)
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn(admin_middleware)),
        )
}

/// Share a calendar with a user
pub async fn create_user_calendar(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserCalendarRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .user_repository
        .find_by_id(payload.user_id)
        .await
        .not_found_or(ApiError::UserNotFound, ApiError::UserVerification)?;
    state
        .calendar_repository
        .find_by_id(payload.calendar_id)
        .await
        .not_found_or(ApiError::CalendarNotFound, ApiError::CalendarVerification)?;

    let links = &state.user_calendar_repository;
    if links
        .exists(payload.user_id, payload.calendar_id)
        .await
        .or_api_error(ApiError::UserCalendarCreation)?
    {
        return Err(ApiError::UserCalendarAlreadyExists);
    }

    let link = links
        .create(payload.user_id, payload.calendar_id, state.now())
        .await
        .conflict_or(
            ApiError::UserCalendarAlreadyExists,
            ApiError::UserCalendarCreation,
        )?;

    Ok(created(link))
}

pub async fn list_user_calendars(
    State(state): State<AppState>,
    Resolved(user): Resolved<User>,
) -> ApiResult<impl IntoResponse> {
    let links = state
        .user_calendar_repository
        .list_for_user(user.user_id)
        .await
        .or_api_error(ApiError::Internal)?;

    Ok(ApiResponse::data(links))
}

pub async fn get_user_calendar(
    State(state): State<AppState>,
    Resolved(user): Resolved<User>,
    Resolved(calendar): Resolved<Calendar>,
) -> ApiResult<impl IntoResponse> {
    let link = state
        .user_calendar_repository
        .find(user.user_id, calendar.calendar_id)
        .await
        .not_found_or(ApiError::UserCalendarNotFound, ApiError::Internal)?;

    Ok(ApiResponse::data(link))
}

pub async fn touch_user_calendar(
    State(state): State<AppState>,
    Resolved(user): Resolved<User>,
    Resolved(calendar): Resolved<Calendar>,
) -> ApiResult<impl IntoResponse> {
    let link = state
        .user_calendar_repository
        .touch(user.user_id, calendar.calendar_id, state.now())
        .await
        .not_found_or(ApiError::UserCalendarNotFound, ApiError::UserCalendarUpdate)?;

    Ok(ApiResponse::data(link).with_message("User calendar updated"))
}

pub async fn delete_user_calendar(
    State(state): State<AppState>,
    Resolved(user): Resolved<User>,
    Resolved(calendar): Resolved<Calendar>,
) -> ApiResult<impl IntoResponse> {
    state
        .user_calendar_repository
        .delete(user.user_id, calendar.calendar_id, state.now())
        .await
        .not_found_or(ApiError::UserCalendarNotFound, ApiError::UserCalendarDelete)?;

    Ok(ApiResponse::message("User calendar deleted"))
}
