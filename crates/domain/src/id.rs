//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Student`](crate::student::Student).
    StudentId
);

define_id!(
    /// Unique identifier for a [`Teacher`](crate::teacher::Teacher).
    TeacherId
);

define_id!(
    /// Unique identifier for a [`Category`](crate::category::Category).
    CategoryId
);

define_id!(
    /// Unique identifier for a [`Lesson`](crate::lesson::Lesson).
    LessonId
);

define_id!(
    /// Unique identifier for a [`Booking`](crate::booking::Booking).
    BookingId
);

define_id!(
    /// Unique identifier for a [`Rating`](crate::rating::Rating).
    RatingId
);

define_id!(
    /// Unique identifier for a [`Conversation`](crate::chat::Conversation).
    ConversationId
);

define_id!(
    /// Unique identifier for a [`Message`](crate::chat::Message).
    MessageId
);

define_id!(
    /// Unique identifier for any account, student or teacher. Token subjects and chat members use it.
    UserId
);

impl From<StudentId> for UserId {
    fn from(id: StudentId) -> Self {
        Self(id.as_uuid())
    }
}

impl From<TeacherId> for UserId {
    fn from(id: TeacherId) -> Self {
        Self(id.as_uuid())
    }
}

impl From<UserId> for StudentId {
    fn from(id: UserId) -> Self {
        Self(id.as_uuid())
    }
}

impl From<UserId> for TeacherId {
    fn from(id: UserId) -> Self {
        Self(id.as_uuid())
    }
}

/// Parse an identifier received from a client, naming the offending field.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] when `raw` is not a UUID.
pub fn parse_id<T: FromStr>(raw: &str, field: &'static str) -> Result<T, ValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidId(field))
}

/// Like [`parse_id`] for a field that must be present.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFields`] when `raw` is absent or blank.
pub fn require_id<T: FromStr>(
    raw: Option<&str>,
    field: &'static [&'static str],
) -> Result<T, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_id(raw, field[0]),
        None => Err(ValidationError::MissingFields(field)),
    }
}
