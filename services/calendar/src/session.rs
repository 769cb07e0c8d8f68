//! Session management backed by the `user_session` table
//!
//! A session is identified by an opaque bearer token and can be extended with
//! its refresh token while it has not expired.

use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult, DatabaseResultExt},
    geolocation::Geolocator,
    models::{
        LoginRequest, LoginResponse, NewSession, RefreshResponse, SessionView, User,
    },
    password::PasswordManager,
    repositories::{RoleRepository, SessionRepository, UserRepository},
    state::SharedClock,
    token::TokenGenerator,
    validation::require_non_empty,
};

/// Where a login request came from
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

/// Session manager
#[derive(Clone)]
pub struct SessionService {
    sessions: SessionRepository,
    users: UserRepository,
    roles: RoleRepository,
    passwords: PasswordManager,
    tokens: Arc<dyn TokenGenerator>,
    geolocator: Geolocator,
    clock: SharedClock,
    ttl: Duration,
}

impl SessionService {
    /// Create a new session manager
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: SessionRepository,
        users: UserRepository,
        roles: RoleRepository,
        passwords: PasswordManager,
        tokens: Arc<dyn TokenGenerator>,
        geolocator: Geolocator,
        clock: SharedClock,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            users,
            roles,
            passwords,
            tokens,
            geolocator,
            clock,
            ttl,
        }
    }

    /// Check credentials and open a new session
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: &LoginRequest, client: ClientInfo) -> ApiResult<LoginResponse> {
        require_non_empty("email", &request.email)?;
        require_non_empty("password", &request.password)?;

        info!("Login attempt for: {}", request.email);

        let credentials = self
            .users
            .find_credentials_by_email(&request.email)
            .await
            .or_api_error(ApiError::UserVerification)?;

        let Some(credentials) = credentials else {
            warn!("Login failed: unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        if !self
            .passwords
            .verify(&credentials.password_hash, &request.password)
            .await
        {
            warn!("Login failed: wrong password for user {}", credentials.user.user_id);
            return Err(ApiError::InvalidCredentials);
        }

        let user = credentials.user;
        let roles = self
            .roles
            .roles_for_user(user.user_id)
            .await
            .or_api_error(ApiError::Internal)?;

        let session_token = self.tokens.generate()?;
        let refresh_token = self.tokens.generate()?;
        let now = self.clock.utc();
        let expires_at = now + self.ttl;

        let location = match &client.ip_address {
            Some(ip) => Some(self.geolocator.locate(ip).await),
            None => None,
        };

        let session = NewSession {
            user_id: user.user_id,
            session_token: session_token.clone(),
            refresh_token: refresh_token.clone(),
            expires_at,
            device_info: client.device_info,
            ip_address: client.ip_address,
            location,
        };
        self.sessions
            .create(&session, now)
            .await
            .or_api_error(ApiError::SessionCreation)?;

        info!("User {} logged in", user.user_id);

        Ok(LoginResponse {
            user,
            session_token,
            refresh_token,
            expires_at,
            roles,
        })
    }

    /// Deactivate the session holding `token`; unknown tokens are ignored
    pub async fn logout(&self, token: &str) -> ApiResult<()> {
        let changed = self
            .sessions
            .deactivate_by_token(token, self.clock.utc())
            .await
            .or_api_error(ApiError::SessionUpdate)?;

        if changed > 0 {
            info!("Session logged out");
        }

        Ok(())
    }

    /// Issue a new session token for the session owning `refresh_token`
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        let session = self
            .sessions
            .find_active_by_refresh_token(refresh_token)
            .await
            .or_api_error(ApiError::Internal)?
            .ok_or(ApiError::SessionInvalid)?;

        let now = self.clock.utc();
        if session.expires_at <= now {
            return Err(ApiError::SessionExpired);
        }

        let session_token = self.tokens.generate()?;
        let expires_at = now + self.ttl;

        self.sessions
            .rotate(session.user_session_id, &session_token, expires_at, now)
            .await
            .not_found_or(ApiError::SessionInvalid, ApiError::SessionUpdate)?;

        info!("Session {} refreshed", session.user_session_id);

        Ok(RefreshResponse {
            session_token,
            expires_at,
        })
    }

    /// Live sessions of a user, newest first, with tokens masked
    pub async fn list(&self, user_id: i64) -> ApiResult<Vec<SessionView>> {
        let sessions = self
            .sessions
            .list_for_user(user_id)
            .await
            .or_api_error(ApiError::Internal)?;

        Ok(sessions.into_iter().map(SessionView::from).collect())
    }

    /// Revoke one of the user's own sessions
    pub async fn delete(&self, user_id: i64, session_id: i64) -> ApiResult<()> {
        self.sessions
            .soft_delete_for_user(session_id, user_id, self.clock.utc())
            .await
            .not_found_or(ApiError::SessionNotFound, ApiError::SessionDelete)
    }

    /// Resolve a bearer token to its live owner
    pub async fn validate(&self, token: &str) -> ApiResult<User> {
        let session = self
            .sessions
            .find_by_token(token)
            .await
            .or_api_error(ApiError::Internal)?
            .ok_or(ApiError::SessionNotFound)?;

        if session.expires_at <= self.clock.utc() {
            return Err(ApiError::SessionExpired);
        }

        Ok(session.user)
    }
}
