//! Event routes, all scoped to a calendar the caller can access

use axum::{
    Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
};
use tower::ServiceBuilder;

use crate::{
    date_range::DateRange,
    error::{ApiError, ApiResult, DatabaseResultExt},
    extract::{JsonBody, Resolved},
    middleware::{
        PathParam, auth_middleware, calendar_access_middleware, require_calendar, require_event,
    },
    models::{Calendar, CreateEventRequest, CreateEventResponse, Event, EventChanges, NewEvent},
    response::{ApiResponse, created},
    state::AppState,
    validation::{require_non_empty, validate_duration},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let calendar_layers = || {
        ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .layer(middleware::from_fn_with_state(
                PathParam::new(state, "calendar_id"),
                require_calendar,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                calendar_access_middleware,
            ))
    };

    let by_event = Router::new()
        .route(
            "/calendar-event/:calendar_id/:event_id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route_layer(calendar_layers().layer(middleware::from_fn_with_state(
            PathParam::new(state, "event_id"),
            require_event,
        )));

    Router::new()
        .route(
            "/calendar-event/:calendar_id",
            get(list_events).post(create_event),
        )
        .route(
            "/calendar-event/:calendar_id/month/:year/:month",
            get(list_events_by_month),
        )
        .route(
            "/calendar-event/:calendar_id/week/:year/:week",
            get(list_events_by_week),
        )
        .route(
            "/calendar-event/:calendar_id/day/:year/:month/:day",
            get(list_events_by_day),
        )
        .route_layer(calendar_layers())
        .merge(by_event)
}

/// Create an event in the path calendar
pub async fn create_event(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
    JsonBody(payload): JsonBody<CreateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    require_non_empty("title", &payload.title)?;
    validate_duration(payload.duration)?;

    if let Some(calendar_id) = payload.calendar_id {
        if calendar_id != calendar.calendar_id {
            return Err(ApiError::InvalidData(
                "calendar_id does not match the calendar in the path".to_string(),
            ));
        }
    }

    let event = NewEvent {
        title: payload.title,
        description: payload.description,
        start: payload.start,
        duration: payload.duration,
        canceled: payload.canceled.unwrap_or(false),
    };

    let event_id = state
        .event_repository
        .create_in_calendar(calendar.calendar_id, &event, state.now())
        .await
        .or_api_error(ApiError::EventCreation)?;

    Ok(created(CreateEventResponse {
        event_id,
        calendar_id: calendar.calendar_id,
    }))
}

pub async fn get_event(Resolved(event): Resolved<Event>) -> impl IntoResponse {
    ApiResponse::data(event)
}

pub async fn update_event(
    State(state): State<AppState>,
    Resolved(event): Resolved<Event>,
    JsonBody(changes): JsonBody<EventChanges>,
) -> ApiResult<impl IntoResponse> {
    if let Some(title) = &changes.title {
        require_non_empty("title", title)?;
    }
    if let Some(duration) = changes.duration {
        validate_duration(duration)?;
    }

    let event = state
        .event_repository
        .update(event.event_id, &changes, state.now())
        .await
        .not_found_or(ApiError::EventNotFound, ApiError::EventUpdate)?;

    Ok(ApiResponse::data(event).with_message("Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Resolved(event): Resolved<Event>,
) -> ApiResult<impl IntoResponse> {
    state
        .event_repository
        .delete(event.event_id, state.now())
        .await
        .not_found_or(ApiError::EventNotFound, ApiError::EventDelete)?;

    Ok(ApiResponse::message("Event deleted"))
}

/// Every live event of the calendar
pub async fn list_events(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
) -> ApiResult<impl IntoResponse> {
    let events = state
        .event_repository
        .list_for_calendar(calendar.calendar_id)
        .await
        .or_api_error(ApiError::Internal)?;

    Ok(ApiResponse::data(events))
}

pub async fn list_events_by_month(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
    Path((_, year, month)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::month(&year, &month)?;
    list_in_range(&state, &calendar, range).await
}

pub async fn list_events_by_week(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
    Path((_, year, week)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::week(&year, &week)?;
    list_in_range(&state, &calendar, range).await
}

pub async fn list_events_by_day(
    State(state): State<AppState>,
    Resolved(calendar): Resolved<Calendar>,
    Path((_, year, month, day)): Path<(String, String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::day(&year, &month, &day)?;
    list_in_range(&state, &calendar, range).await
}

async fn list_in_range(
    state: &AppState,
    calendar: &Calendar,
    range: DateRange,
) -> ApiResult<ApiResponse<Vec<Event>>> {
    let events = state
        .event_repository
        .list_in_range(calendar.calendar_id, &range)
        .await
        .or_api_error(ApiError::Internal)?;

    Ok(ApiResponse::data(events))
}
