//! Calendar service routes

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use common::database::health_check;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{response::ApiResponse, state::AppState};

pub mod auth;
pub mod calendars;
pub mod events;
pub mod roles;
pub mod user_calendars;
pub mod users;

/// Create the router for the calendar service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router(&state))
        .merge(users::router(&state))
        .merge(roles::router(&state))
        .merge(calendars::router(&state))
        .merge(events::router(&state))
        .merge(user_calendars::router(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = health_check(&state.db_pool).await;

    ApiResponse::data(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "calendar",
        "database": database,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Settings,
        middleware::{
            AuthUser, PathParam, RequiredRoles, admin_middleware, optional_auth_middleware,
            require_event, roles_middleware,
        },
        models::{Role, User},
        token::RandomTokenGenerator,
    };
    use axum::{
        Extension,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        middleware,
        response::Response,
    };
    use chrono::Utc;
    use common::database::{DatabaseConfig, init_lazy_pool};
    use mockable::DefaultClock;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    // Nothing here reaches the database; the pool never connects.
    fn test_state() -> AppState {
        let config = DatabaseConfig {
            database_url: None,
            user: "postgres".to_string(),
            password: String::new(),
            host: "127.0.0.1".to_string(),
            port: 1,
            database: "calendar".to_string(),
            max_connections: 1,
            min_connections: 0,
            connection_timeout: 1,
        };
        let pool = init_lazy_pool(&config).unwrap();
        let settings = Settings {
            password_memory_kib: 1024,
            password_iterations: 1,
            ..Settings::default()
        };

        AppState::new(
            pool,
            settings,
            Arc::new(DefaultClock),
            Arc::new(RandomTokenGenerator),
        )
        .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn caller(roles: &[&str]) -> AuthUser {
        AuthUser {
            user: User {
                user_id: 7,
                lastname: "D".to_string(),
                firstname: "J".to_string(),
                email: "j@x.io".to_string(),
                created_at: Utc::now(),
                updated_at: None,
            },
            roles: roles
                .iter()
                .enumerate()
                .map(|(i, name)| Role {
                    role_id: i as i64 + 1,
                    name: name.to_string(),
                    description: None,
                    created_at: Utc::now(),
                    updated_at: None,
                })
                .collect(),
        }
    }

    async fn whoami(auth: Option<Extension<AuthUser>>) -> Response {
        let name = auth.map(|Extension(auth)| auth.user.email);
        ApiResponse::data(json!({ "email": name })).into_response()
    }

    #[tokio::test]
    async fn test_protected_routes_require_a_bearer_token() {
        for (method, uri) in [
            ("GET", "/auth/me"),
            ("GET", "/auth/sessions"),
            ("GET", "/calendar"),
            ("GET", "/calendar/1"),
            ("GET", "/calendar-event/1/day/2024/1/15"),
            ("GET", "/user/1"),
            ("GET", "/roles"),
            ("POST", "/user-calendar"),
        ] {
            let (status, body) = send(create_router(test_state()), empty_request(method, uri)).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "UserNotAuthenticated");
        }
    }

    #[tokio::test]
    async fn test_non_bearer_authorization_is_rejected() {
        let request = Request::builder()
            .uri("/calendar")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(create_router(test_state()), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UserNotAuthenticated");
    }

    #[tokio::test]
    async fn test_logout_without_bearer_is_a_bad_request() {
        let (status, body) =
            send(create_router(test_state()), empty_request("POST", "/auth/logout")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "SessionInvalid");
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let cases = [
            (
                r#"{"lastname":"D","firstname":"J","email":"j@x.io","password":"12345"}"#,
                "PasswordTooShort",
            ),
            (
                r#"{"lastname":"D","firstname":"J","email":"not-an-email","password":"secret1"}"#,
                "InvalidEmailFormat",
            ),
            (
                r#"{"lastname":"","firstname":"J","email":"j@x.io","password":"secret1"}"#,
                "InvalidData",
            ),
            (r#"{"lastname":"D"}"#, "InvalidData"),
            ("not json", "InvalidData"),
        ];

        for (body, kind) in cases {
            let (status, response) =
                send(create_router(test_state()), json_request("POST", "/user", body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(response["error"], kind, "{body}");
        }
    }

    #[tokio::test]
    async fn test_login_requires_email_and_password() {
        let (status, body) = send(
            create_router(test_state()),
            json_request("POST", "/auth/login", r#"{"email":"","password":"secret1"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidData");
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let app = |roles: &'static [&'static str]| {
            Router::new()
                .route("/admin", get(whoami))
                .route_layer(middleware::from_fn(admin_middleware))
                .layer(Extension(caller(roles)))
        };

        let (status, body) = send(app(&["user"]), empty_request("GET", "/admin")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "InsufficientPermissions");

        let (status, body) = send(app(&["admin"]), empty_request("GET", "/admin")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "j@x.io");
    }

    #[tokio::test]
    async fn test_roles_gate() {
        let app = |roles: &'static [&'static str]| {
            Router::new()
                .route("/editors", get(whoami))
                .route_layer(middleware::from_fn_with_state(
                    RequiredRoles::any(["editor", "admin"]),
                    roles_middleware,
                ))
                .layer(Extension(caller(roles)))
        };

        let (status, _) = send(app(&["user"]), empty_request("GET", "/editors")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(app(&["user", "editor"]), empty_request("GET", "/editors")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_role_gate_without_authentication() {
        let app = Router::new()
            .route("/editors", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                RequiredRoles::one("editor"),
                roles_middleware,
            ));

        let (status, body) = send(app, empty_request("GET", "/editors")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UserNotAuthenticated");
    }

    #[tokio::test]
    async fn test_optional_auth_continues_anonymously() {
        let state = test_state();
        let app = Router::new()
            .route("/maybe", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth_middleware,
            ))
            .with_state(state);

        let (status, body) = send(app, empty_request("GET", "/maybe")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], Value::Null);
    }

    #[tokio::test]
    async fn test_user_roles_are_listed_under_roles_only() {
        let response = create_router(test_state())
            .oneshot(empty_request("GET", "/user/1/roles"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (status, body) =
            send(create_router(test_state()), empty_request("GET", "/roles/user/1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UserNotAuthenticated");
    }

    #[tokio::test]
    async fn test_event_resolver_needs_a_resolved_calendar() {
        let state = test_state();
        let app = Router::new()
            .route("/events/:event_id", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                PathParam::new(&state, "event_id"),
                require_event,
            ))
            .with_state(state);

        let (status, body) = send(app.clone(), empty_request("GET", "/events/5")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal");

        let (status, body) = send(app, empty_request("GET", "/events/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidEventID");
    }
}
