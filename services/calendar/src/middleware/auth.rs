//! Authentication and role gates

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult, DatabaseResultExt},
    models::{Role, User, role::ADMIN_ROLE},
    state::AppState,
};

/// The caller identified by a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|name| self.has_role(name.as_ref()))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// The caller acts on `user_id` themself or is an administrator
    pub fn ensure_self_or_admin(&self, user_id: i64) -> ApiResult<()> {
        if self.user.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::InsufficientPermissions)
        }
    }
}

/// Token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let token = bearer_token(headers).ok_or(ApiError::UserNotAuthenticated)?;

    let user = state
        .session_service
        .validate(token)
        .await
        .map_err(|e| match e {
            ApiError::SessionNotFound | ApiError::SessionExpired => {
                warn!("Rejected bearer token: {}", e);
                ApiError::SessionInvalid
            }
            other => other,
        })?;

    let roles = state
        .role_repository
        .roles_for_user(user.user_id)
        .await
        .or_api_error(ApiError::Internal)?;

    Ok(AuthUser { user, roles })
}

/// Require a valid session and stash the caller with their roles
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// Stash the caller when a valid session is presented, continue anonymously otherwise
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(auth_user) = authenticate(&state, req.headers()).await {
        req.extensions_mut().insert(auth_user);
    }

    next.run(req).await
}

fn caller(req: &Request) -> ApiResult<&AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::UserNotAuthenticated)
}

/// Only let administrators through; runs after [`auth_middleware`]
pub async fn admin_middleware(req: Request, next: Next) -> Result<Response, ApiError> {
    if !caller(&req)?.is_admin() {
        return Err(ApiError::InsufficientPermissions);
    }

    Ok(next.run(req).await)
}

/// Roles of which the caller must hold at least one
#[derive(Debug, Clone)]
pub struct RequiredRoles(pub Vec<String>);

impl RequiredRoles {
    pub fn one(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn any<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

/// Only let callers holding one of the [`RequiredRoles`] through
pub async fn roles_middleware(
    State(required): State<RequiredRoles>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !caller(&req)?.has_any_role(&required.0) {
        return Err(ApiError::InsufficientPermissions);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn role(name: &str) -> Role {
        Role {
            role_id: 1,
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn auth_user(user_id: i64, roles: &[&str]) -> AuthUser {
        AuthUser {
            user: User {
                user_id,
                lastname: "D".to_string(),
                firstname: "J".to_string(),
                email: "j@x.io".to_string(),
                created_at: Utc::now(),
                updated_at: None,
            },
            roles: roles.iter().map(|name| role(name)).collect(),
        }
    }

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_role_checks() {
        let admin = auth_user(1, &["admin", "user"]);
        let user = auth_user(2, &["user"]);

        assert!(admin.is_admin());
        assert!(!user.is_admin());
        assert!(user.has_any_role(&["editor", "user"]));
        assert!(!user.has_any_role(&["editor"]));
    }

    #[test]
    fn test_self_or_admin() {
        let admin = auth_user(1, &["admin"]);
        let user = auth_user(2, &["user"]);

        assert!(user.ensure_self_or_admin(2).is_ok());
        assert_eq!(
            user.ensure_self_or_admin(3),
            Err(ApiError::InsufficientPermissions)
        );
        assert!(admin.ensure_self_or_admin(3).is_ok());
    }

    #[test]
    fn test_required_roles() {
        assert_eq!(RequiredRoles::one("admin").0, vec!["admin".to_string()]);
        assert_eq!(RequiredRoles::any(["a", "b"]).0.len(), 2);
    }
}
