//! Storage-specific error type wrapping sqlx errors.

use tutorhub_domain::error::{ConflictError, TutorHubError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode a stored JSON document.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// The domain conflict behind a unique-constraint violation, if any.
    ///
    /// `SQLite` names the violated columns in the message
    /// (`UNIQUE constraint failed: bookings.teacher_id, bookings.scheduled_at`).
    fn conflict(&self) -> Option<ConflictError> {
        let Self::Database(sqlx::Error::Database(db)) = self else {
            return None;
        };
        if !db.is_unique_violation() {
            return None;
        }
        let message = db.message();
        let conflict = if message.contains("bookings.teacher_id") {
            ConflictError::TeacherSchedule
        } else if message.contains("bookings.student_id") {
            ConflictError::StudentSchedule
        } else if message.contains("ratings.") {
            ConflictError::AlreadyRated
        } else if message.contains("categories.name") {
            ConflictError::CategoryNameTaken
        } else if message.contains(".email") {
            ConflictError::EmailTaken
        } else if message.contains(".slug") {
            ConflictError::SlugTaken
        } else {
            ConflictError::Duplicate
        };
        Some(conflict)
    }
}

impl From<StorageError> for TutorHubError {
    fn from(err: StorageError) -> Self {
        match err.conflict() {
            Some(conflict) => Self::Conflict(conflict),
            None => Self::Storage(Box::new(err)),
        }
    }
}

/// Wrap a column that failed to parse into a decode error.
pub(crate) fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}
