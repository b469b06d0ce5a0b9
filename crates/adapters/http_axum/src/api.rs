//! JSON REST API handler modules.
//!
//! Each module exposes a `routes` function nested under its resource path.

#[allow(clippy::missing_errors_doc)]
pub mod auth;
#[allow(clippy::missing_errors_doc)]
pub mod bookings;
#[allow(clippy::missing_errors_doc)]
pub mod categories;
#[allow(clippy::missing_errors_doc)]
pub mod chats;
#[allow(clippy::missing_errors_doc)]
pub mod lessons;
#[allow(clippy::missing_errors_doc)]
pub mod ratings;
#[allow(clippy::missing_errors_doc)]
pub mod students;
#[allow(clippy::missing_errors_doc)]
pub mod teachers;
#[allow(clippy::missing_errors_doc)]
pub mod uploads;

use std::str::FromStr;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tutorhub_domain::error::{TutorHubError, ValidationError};
use tutorhub_domain::id::parse_id;

use crate::state::{AppState, Backend};

/// Build the `/api` sub-router.
pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .nest("/auth", auth::routes::<B>())
        .nest("/students", students::routes::<B>())
        .nest("/teachers", teachers::routes::<B>())
        .nest("/uploads", uploads::routes::<B>())
        .nest("/categories", categories::routes::<B>())
        .nest("/lessons", lessons::routes::<B>())
        .nest("/bookings", bookings::routes::<B>())
        .nest("/ratings", ratings::routes::<B>())
        .nest("/chats", chats::routes::<B>())
}

/// A JSON body with the status it should be sent with.
pub enum Reply<T> {
    Ok(T),
    Created(T),
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(body) => Json(body).into_response(),
            Self::Created(body) => (StatusCode::CREATED, Json(body)).into_response(),
        }
    }
}

/// Parse the `{id}` path segment.
pub(crate) fn path_id<T: FromStr>(raw: &str) -> Result<T, ValidationError> {
    parse_id(raw, "id")
}

/// Parse an optional id filter from the query string.
pub(crate) fn query_id<T: FromStr>(
    raw: Option<&str>,
    field: &'static str,
) -> Result<Option<T>, ValidationError> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_id(raw, field))
        .transpose()
}

/// Parse an optional value filter (status, instant) from the query string.
pub(crate) fn query_value<T, E>(
    raw: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<Option<T>, E> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(parse)
        .transpose()
}

pub(crate) fn internal(err: impl std::error::Error + Send + Sync + 'static) -> TutorHubError {
    TutorHubError::Internal(Box::new(err))
}
