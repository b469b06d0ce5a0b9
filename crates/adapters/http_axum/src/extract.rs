//! Request extractors.
//!
//! [`Json`] and [`Query`] stand in for the axum extractors of the same name so
//! that unreadable requests answer with the usual `{"error", "message"}` body.
//! [`Json`] reads the body whatever its `Content-Type`.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use tutorhub_domain::error::AuthError;
use tutorhub_domain::identity::Identity;

use crate::error::{ApiError, RequestError};
use crate::state::{AppState, Backend};

/// A JSON request or response body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|err| {
            if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                RequestError::BodyTooLarge
            } else {
                RequestError::InvalidBody(err.body_text())
            }
        })?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|err| RequestError::InvalidBody(err.to_string()))?;
        Ok(Self(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Deserialized query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) = axum::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|err| RequestError::InvalidQuery(err.body_text()))?;
        Ok(Self(value))
    }
}

/// The caller behind a valid `Authorization: Bearer <token>` header.
///
/// Rejects with 401 when the header is missing or the token does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<B: Backend> FromRequestParts<AppState<B>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let identity = state.auth.verify(token)?;
        Ok(Self(identity))
    }
}
