//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tutorhub_domain::error::{
    AuthError, ForbiddenError, NotFoundError, TutorHubError, ValidationError,
};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Failures specific to multipart avatar uploads.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file was sent")]
    NoFile,

    #[error("file exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("unsupported content type `{0}`")]
    UnsupportedType(String),

    #[error("malformed multipart body")]
    Multipart(#[source] axum::extract::multipart::MultipartError),

    #[error("{}", .0.body_text())]
    NotMultipart(#[source] axum::extract::multipart::MultipartRejection),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NoFile | Self::Multipart(_) | Self::NotMultipart(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NoFile => "no_file",
            Self::TooLarge(_) => "file_too_large",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::Multipart(_) | Self::NotMultipart(_) => "invalid_multipart",
        }
    }
}

/// A request the JSON or query extractors could not read.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("request body is too large")]
    BodyTooLarge,

    #[error("invalid query string: {0}")]
    InvalidQuery(String),
}

impl RequestError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "invalid_body",
            Self::BodyTooLarge => "payload_too_large",
            Self::InvalidQuery(_) => "invalid_query",
        }
    }
}

/// Maps [`TutorHubError`], upload failures and unreadable requests to an HTTP
/// response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(TutorHubError),
    Upload(UploadError),
    Request(RequestError),
}

impl From<TutorHubError> for ApiError {
    fn from(err: TutorHubError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<NotFoundError> for ApiError {
    fn from(err: NotFoundError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<ForbiddenError> for ApiError {
    fn from(err: ForbiddenError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self::Upload(err)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        Self::Request(err)
    }
}

fn domain_parts(err: &TutorHubError) -> (StatusCode, String) {
    match err {
        TutorHubError::Validation(inner) => (StatusCode::BAD_REQUEST, inner.to_string()),
        TutorHubError::NotFound(inner) => (StatusCode::NOT_FOUND, inner.to_string()),
        TutorHubError::Conflict(inner) => (StatusCode::CONFLICT, inner.to_string()),
        TutorHubError::Unauthorized(inner) => (StatusCode::UNAUTHORIZED, inner.to_string()),
        TutorHubError::Forbidden(inner) => (StatusCode::FORBIDDEN, inner.to_string()),
        TutorHubError::Upstream(inner) => (StatusCode::BAD_GATEWAY, inner.to_string()),
        TutorHubError::Storage(source) => {
            tracing::error!(error = %source, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
        TutorHubError::Internal(source) => {
            tracing::error!(error = %source, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Domain(err) => {
                let (status, message) = domain_parts(err);
                (status, err.code(), message)
            }
            Self::Upload(err) => (err.status(), err.code(), err.to_string()),
            Self::Request(err) => (err.status(), err.code(), err.to_string()),
        };

        (
            status,
            Json(ErrorBody {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}
