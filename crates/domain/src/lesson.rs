//! Lesson: an offer published by a teacher.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::id::{CategoryId, LessonId, TeacherId, parse_id};
use crate::input::{parse_price, trimmed};
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    #[default]
    Available,
    Scheduled,
    InProgress,
    Cancelled,
    Completed,
}

impl LessonStatus {
    pub const ALL: [Self; 5] = [
        Self::Available,
        Self::Scheduled,
        Self::InProgress,
        Self::Cancelled,
        Self::Completed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Whether a teacher may set this status by hand.
    ///
    /// `scheduled` is reserved for the booking sync.
    #[must_use]
    pub fn is_manual(self) -> bool {
        self != Self::Scheduled
    }

    /// Cancelled and completed lessons are never reopened automatically.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<CategoryId>,
    pub teacher_id: TeacherId,
    pub status: LessonStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Lesson {
    /// Texts searched by a free-text `q` filter.
    pub fn search_texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str()).chain(self.description.as_deref())
    }

    pub fn set_status(&mut self, status: LessonStatus) {
        self.status = status;
        self.updated_at = now();
    }
}

/// Raw lesson fields as received from a client.
///
/// Ids and price are kept untyped until [`LessonInput::validate`] so that
/// malformed values produce field-specific errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonInput {
    #[serde(default, deserialize_with = "trimmed")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default, deserialize_with = "trimmed")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub teacher_id: Option<String>,
}

/// Validated lesson fields; absent members mean "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<CategoryId>,
    pub teacher_id: Option<TeacherId>,
}

impl LessonInput {
    /// Type-check the raw fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidId`] or
    /// [`ValidationError::InvalidPrice`] for malformed values.
    pub fn validate(self) -> Result<LessonFields, ValidationError> {
        Ok(LessonFields {
            title: self.title,
            description: self.description,
            price: parse_price(&self.price)?,
            category_id: self
                .category_id
                .map(|raw| parse_id(&raw, "category_id"))
                .transpose()?,
            teacher_id: self
                .teacher_id
                .map(|raw| parse_id(&raw, "teacher_id"))
                .transpose()?,
        })
    }
}

impl LessonFields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a new lesson, which always starts `available`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] without a title or teacher.
    pub fn into_lesson(self) -> Result<Lesson, ValidationError> {
        let (Some(title), Some(teacher_id)) = (self.title, self.teacher_id) else {
            return Err(ValidationError::MissingFields(&["title", "teacher_id"]));
        };
        let ts = now();
        Ok(Lesson {
            id: LessonId::new(),
            title,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
            teacher_id,
            status: LessonStatus::Available,
            created_at: ts,
            updated_at: ts,
        })
    }

    pub fn apply(self, lesson: &mut Lesson) {
        if let Some(title) = self.title {
            lesson.title = title;
        }
        if self.description.is_some() {
            lesson.description = self.description;
        }
        if self.price.is_some() {
            lesson.price = self.price;
        }
        if self.category_id.is_some() {
            lesson.category_id = self.category_id;
        }
        if let Some(teacher_id) = self.teacher_id {
            lesson.teacher_id = teacher_id;
        }
        lesson.updated_at = now();
    }
}

/// Audit record appended on every manual status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonStatusChange {
    pub lesson_id: LessonId,
    pub new_status: LessonStatus,
    pub teacher_id: Option<TeacherId>,
    pub changed_at: Timestamp,
}

/// Parse a status for a manual change.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFields`] when absent and
/// [`ValidationError::InvalidStatus`] for unknown or sync-only values.
pub fn parse_manual_status(raw: Option<&str>) -> Result<LessonStatus, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingFields(&["status"]))?;
    let status: LessonStatus = raw.parse()?;
    if status.is_manual() {
        Ok(status)
    } else {
        Err(ValidationError::InvalidStatus(raw.to_string()))
    }
}
