//! User account routes

use axum::{
    Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::{
    error::{ApiError, ApiResult, DatabaseResultExt, triage},
    extract::{JsonBody, Resolved},
    middleware::{AuthUser, PathParam, auth_middleware, require_user},
    models::{
        CreateUserRequest, CreateUserResponse, NewUser, UpdateUserRequest, User, UserChanges,
        role::DEFAULT_ROLE,
    },
    response::{ApiResponse, created},
    state::AppState,
    validation::{require_non_empty, validate_email, validate_password},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let by_id = Router::new()
        .route(
            "/user/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn_with_state(
                    PathParam::new(state, "user_id"),
                    require_user,
                )),
        );

    Router::new()
        .route("/user", post(create_user))
        .merge(by_id)
}

/// Register a new account
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    require_non_empty("lastname", &payload.lastname)?;
    require_non_empty("firstname", &payload.firstname)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    if state
        .user_repository
        .email_taken(&payload.email, None)
        .await
        .or_api_error(ApiError::UserCreation)?
    {
        return Err(ApiError::UserAlreadyExists);
    }

    let new_user = NewUser {
        lastname: payload.lastname,
        firstname: payload.firstname,
        email: payload.email,
        password_hash: state.passwords.hash(&payload.password).await?,
    };

    let user_id = state
        .user_repository
        .create(&new_user, DEFAULT_ROLE, state.now())
        .await
        .conflict_or(ApiError::UserAlreadyExists, ApiError::UserCreation)?;

    Ok(created(CreateUserResponse { user_id }))
}

pub async fn get_user(Resolved(user): Resolved<User>) -> impl IntoResponse {
    ApiResponse::data(user)
}

/// Update an account; callers may only change themselves unless admin
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Resolved(user): Resolved<User>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.ensure_self_or_admin(user.user_id)?;

    if let Some(lastname) = &payload.lastname {
        require_non_empty("lastname", lastname)?;
    }
    if let Some(firstname) = &payload.firstname {
        require_non_empty("firstname", firstname)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;

        if state
            .user_repository
            .email_taken(email, Some(user.user_id))
            .await
            .or_api_error(ApiError::UserUpdate)?
        {
            return Err(ApiError::UserAlreadyExists);
        }
    }

    let password_hash = match &payload.password {
        Some(password) => {
            validate_password(password)?;
            Some(state.passwords.hash(password).await?)
        }
        None => None,
    };

    let changes = UserChanges {
        lastname: payload.lastname,
        firstname: payload.firstname,
        email: payload.email,
        password_hash,
    };

    let user = state
        .user_repository
        .update(user.user_id, &changes, state.now())
        .await
        .map_err(|e| {
            triage(
                e,
                Some(ApiError::UserNotFound),
                Some(ApiError::UserAlreadyExists),
                ApiError::UserUpdate,
            )
        })?;

    Ok(ApiResponse::data(user).with_message("User updated"))
}

/// Delete an account and everything hanging off it
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Resolved(user): Resolved<User>,
) -> ApiResult<impl IntoResponse> {
    auth.ensure_self_or_admin(user.user_id)?;

    state
        .user_repository
        .delete(user.user_id, state.now())
        .await
        .not_found_or(ApiError::UserNotFound, ApiError::UserDelete)?;

    Ok(ApiResponse::message("User deleted"))
}
