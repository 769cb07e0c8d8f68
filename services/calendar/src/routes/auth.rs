//! Session routes

use axum::{
    Router,
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_extra::{TypedHeader, headers::UserAgent};
use std::net::SocketAddr;

use crate::{
    error::{ApiError, ApiResult},
    extract::JsonBody,
    geolocation::client_ip,
    middleware::{AuthUser, auth_middleware, bearer_token},
    models::{LoginRequest, RefreshRequest, UserProfile},
    response::ApiResponse,
    session::ClientInfo,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/sessions/:session_id", delete(delete_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .merge(authenticated)
}

/// Open a session for valid credentials
pub async fn login(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let client = ClientInfo {
        device_info: user_agent.map(|TypedHeader(agent)| agent.as_str().to_string()),
        ip_address: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
    };

    let response = state.session_service.login(&payload, client).await?;

    Ok(ApiResponse::data(response))
}

/// Deactivate the presented session; repeating it is harmless
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = bearer_token(&headers).ok_or(ApiError::MalformedBearer)?;

    state.session_service.logout(token).await?;

    Ok(ApiResponse::message("Logged out"))
}

pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = state.session_service.refresh(&payload.refresh_token).await?;
    Ok(ApiResponse::data(response))
}

/// The caller and their roles
pub async fn me(auth: AuthUser) -> impl IntoResponse {
    ApiResponse::data(UserProfile {
        user: auth.user,
        roles: auth.roles,
    })
}

pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let sessions = state.session_service.list(auth.user.user_id).await?;
    Ok(ApiResponse::data(sessions))
}

/// Revoke one of the caller's sessions
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session_id = session_id
        .parse()
        .map_err(|_| ApiError::SessionNotFound)?;

    state
        .session_service
        .delete(auth.user.user_id, session_id)
        .await?;

    Ok(ApiResponse::message("Session deleted"))
}
