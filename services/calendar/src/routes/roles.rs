//! Role administration routes, admin only

use axum::{
    Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::{
    error::ApiResult,
    extract::{JsonBody, Resolved},
    middleware::{PathParam, admin_middleware, auth_middleware, require_user},
    models::{CreateRoleRequest, CreateRoleResponse, RoleAssignmentRequest, RoleChanges, User},
    response::{ApiResponse, created},
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let user_roles = Router::new()
        .route("/roles/user/:user_id", get(list_user_roles))
        .route_layer(middleware::from_fn_with_state(
            PathParam::new(state, "user_id"),
            require_user,
        ));

    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/:role_id",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/roles/assign", post(assign_role))
        .route("/roles/revoke", post(revoke_role))
        .merge(user_roles)
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn(admin_middleware)),
        )
}

pub async fn list_roles(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let roles = state.role_service.list().await?;
    Ok(ApiResponse::data(roles))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let role = state.role_service.get(&role_id).await?;
    Ok(ApiResponse::data(role))
}

pub async fn create_role(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let role_id = state.role_service.create(&payload).await?;
    Ok(created(CreateRoleResponse { role_id }))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    JsonBody(changes): JsonBody<RoleChanges>,
) -> ApiResult<impl IntoResponse> {
    let role = state.role_service.update(&role_id, &changes).await?;
    Ok(ApiResponse::data(role).with_message("Role updated"))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.role_service.delete(&role_id).await?;
    Ok(ApiResponse::message("Role deleted"))
}

pub async fn assign_role(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RoleAssignmentRequest>,
) -> ApiResult<impl IntoResponse> {
    state.role_service.assign(&payload).await?;
    Ok(ApiResponse::message("Role assigned"))
}

pub async fn revoke_role(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RoleAssignmentRequest>,
) -> ApiResult<impl IntoResponse> {
    state.role_service.revoke(&payload).await?;
    Ok(ApiResponse::message("Role revoked"))
}

pub async fn list_user_roles(
    State(state): State<AppState>,
    Resolved(user): Resolved<User>,
) -> ApiResult<impl IntoResponse> {
    let roles = state.role_service.roles_of(&user).await?;
    Ok(ApiResponse::data(roles))
}
