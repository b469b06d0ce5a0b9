//! Common error types used across the workspace.
//!
//! Each layer converts its own failures into [`TutorHubError`] via `#[from]`.
//! Every leaf error carries a stable snake_case [`code`](TutorHubError::code)
//! that the HTTP adapter puts in response bodies.

use crate::identity::UserKind;

/// Top-level error for every use-case.
#[derive(Debug, thiserror::Error)]
pub enum TutorHubError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("forbidden: {0}")]
    Forbidden(#[from] ForbiddenError),

    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamError),

    /// Opaque failure from a storage adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Any other adapter failure (randomness, token signing, file IO).
    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TutorHubError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::NotFound(_) => "not_found",
            Self::Conflict(err) => err.code(),
            Self::Unauthorized(err) => err.code(),
            Self::Forbidden(_) => "forbidden",
            Self::Upstream(err) => err.code(),
            Self::Storage(_) | Self::Internal(_) => "internal_error",
        }
    }
}

/// Input that breaks a domain rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(&'static [&'static str]),

    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid identifier for `{0}`")]
    InvalidId(&'static str),

    #[error("price must be a number")]
    InvalidPrice,

    #[error("score must be between {min} and {max}")]
    ScoreOutOfRange { min: f64, max: f64 },

    #[error("invalid date-time for `{0}`")]
    InvalidDateTime(&'static str),

    #[error("no fields to update")]
    NoFieldsToUpdate,

    #[error("invalid status `{0}`")]
    InvalidStatus(String),

    #[error("the lesson does not belong to the teacher")]
    LessonTeacherMismatch,

    #[error("the student must have completed the lesson to rate it")]
    DidNotAttend,

    #[error("message text must not be empty")]
    EmptyMessage,

    #[error("cannot open a conversation with yourself")]
    SelfConversation,

    #[error("invalid search pattern for `{0}`")]
    InvalidPattern(&'static str),

    #[error("skill must not be empty")]
    EmptySkill,

    #[error("email and password are required")]
    MissingCredentials,

    #[error("postal code must contain 8 digits")]
    InvalidPostalCode,
}

impl ValidationError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "missing_fields",
            Self::EmptyName => "empty_name",
            Self::InvalidId(_) => "invalid_id",
            Self::InvalidPrice => "invalid_price_format",
            Self::ScoreOutOfRange { .. } => "invalid_score_range",
            Self::InvalidDateTime(_) => "invalid_datetime_format",
            Self::NoFieldsToUpdate => "no_fields_to_update",
            Self::InvalidStatus(_) => "invalid_status",
            Self::LessonTeacherMismatch => "lesson_does_not_belong_to_teacher",
            Self::DidNotAttend => "student_did_not_attend_lesson",
            Self::EmptyMessage => "empty_message",
            Self::SelfConversation => "self_conversation",
            Self::InvalidPattern(_) => "invalid_search_pattern",
            Self::EmptySkill => "empty_skill",
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidPostalCode => "invalid_postal_code",
        }
    }
}

/// An external service the request depends on failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} could not be reached")]
    Unreachable { service: &'static str },

    #[error("{service} answered with status {status}")]
    BadStatus { service: &'static str, status: u16 },

    #[error("{service} sent an unreadable response")]
    InvalidResponse { service: &'static str },
}

impl UpstreamError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "failed_lookup",
            Self::BadStatus { .. } | Self::InvalidResponse { .. } => "upstream_error",
        }
    }
}

/// A referenced record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A write would break a uniqueness rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("email already registered")]
    EmailTaken,

    #[error("slug already taken")]
    SlugTaken,

    #[error("category name already exists")]
    CategoryNameTaken,

    #[error("category is used by {lessons} lesson(s)")]
    CategoryInUse { lessons: usize },

    #[error("the teacher already has a booking at this time")]
    TeacherSchedule,

    #[error("the student already has a booking at this time")]
    StudentSchedule,

    #[error("the student already rated this lesson")]
    AlreadyRated,

    #[error("duplicate record")]
    Duplicate,
}

impl ConflictError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmailTaken => "email_already_exists",
            Self::SlugTaken => "slug_already_exists",
            Self::CategoryNameTaken => "category_already_exists",
            Self::CategoryInUse { .. } => "category_in_use",
            Self::TeacherSchedule => "teacher_schedule_conflict",
            Self::StudentSchedule => "student_schedule_conflict",
            Self::AlreadyRated => "already_rated",
            Self::Duplicate => "duplicate_key",
        }
    }
}

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid email or password")]
    InvalidCredentials,
}

impl AuthError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

/// The caller is authenticated but may not perform the operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForbiddenError {
    #[error("only the profile owner may do this")]
    NotOwner,

    #[error("only {0} accounts may do this")]
    WrongKind(UserKind),
}
