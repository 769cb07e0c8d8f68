//! Request extractors reporting failures in the response envelope

use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::{error::ApiError, middleware::auth::AuthUser};

/// JSON body whose rejection is a `400 InvalidData`
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidData(rejection.body_text()))?;

        Ok(Self(value))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::UserNotAuthenticated)
    }
}

/// An entity loaded from a path parameter by one of the resolver middlewares
#[derive(Debug, Clone)]
pub struct Resolved<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Resolved<T>
where
    S: Send + Sync,
    T: Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<T>() {
            Some(value) => Ok(Self(value.clone())),
            None => {
                // A route is missing its resolver layer
                error!("No resolved {} in request", std::any::type_name::<T>());
                Err(ApiError::Internal)
            }
        }
    }
}
