//! Booking: a student's appointment for a lesson at a concrete instant.
//!
//! Also holds the rules that keep a lesson's status in step with its
//! bookings. They are plain functions over a [`LessonBookingTally`] so they
//! can be tested without storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{BookingId, LessonId, StudentId, TeacherId, parse_id};
use crate::input::{parse_instant, trimmed};
use crate::lesson::LessonStatus;
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
    Absent,
}

impl BookingStatus {
    pub const ALL: [Self; 5] = [
        Self::Scheduled,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
        Self::Absent,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Absent => "absent",
        }
    }

    /// Active bookings hold the slot: `scheduled` or `confirmed`.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
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
pub struct Booking {
    pub id: BookingId,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub lesson_id: LessonId,
    pub scheduled_at: Timestamp,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    pub fn set_status(&mut self, status: BookingStatus) {
        self.status = status;
        self.updated_at = now();
    }
}

/// Raw booking fields as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingInput {
    #[serde(default, deserialize_with = "trimmed")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub teacher_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub lesson_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub scheduled_at: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Validated booking fields; absent members mean "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFields {
    pub student_id: Option<StudentId>,
    pub teacher_id: Option<TeacherId>,
    pub lesson_id: Option<LessonId>,
    pub scheduled_at: Option<Timestamp>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

const REQUIRED: &[&str] = &["student_id", "teacher_id", "lesson_id", "scheduled_at"];

impl BookingInput {
    /// Ensure every field needed to create a booking is present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`].
    pub fn require_all(&self) -> Result<(), ValidationError> {
        let present = [
            &self.student_id,
            &self.teacher_id,
            &self.lesson_id,
            &self.scheduled_at,
        ]
        .iter()
        .all(|field| field.is_some());
        if present {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(REQUIRED))
        }
    }

    /// Type-check the raw fields.
    ///
    /// # Errors
    ///
    /// Returns a field-specific [`ValidationError`] for malformed ids,
    /// instants or statuses.
    pub fn validate(self) -> Result<BookingFields, ValidationError> {
        Ok(BookingFields {
            student_id: self
                .student_id
                .map(|raw| parse_id(&raw, "student_id"))
                .transpose()?,
            teacher_id: self
                .teacher_id
                .map(|raw| parse_id(&raw, "teacher_id"))
                .transpose()?,
            lesson_id: self
                .lesson_id
                .map(|raw| parse_id(&raw, "lesson_id"))
                .transpose()?,
            scheduled_at: self
                .scheduled_at
                .map(|raw| parse_instant(&raw, "scheduled_at"))
                .transpose()?,
            status: self.status.map(|raw| raw.parse()).transpose()?,
            notes: self.notes,
        })
    }
}

impl BookingFields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a new booking; status defaults to `scheduled`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] when a required field is absent.
    pub fn into_booking(self) -> Result<Booking, ValidationError> {
        let (Some(student_id), Some(teacher_id), Some(lesson_id), Some(scheduled_at)) = (
            self.student_id,
            self.teacher_id,
            self.lesson_id,
            self.scheduled_at,
        ) else {
            return Err(ValidationError::MissingFields(REQUIRED));
        };
        let ts = now();
        Ok(Booking {
            id: BookingId::new(),
            student_id,
            teacher_id,
            lesson_id,
            scheduled_at,
            status: self.status.unwrap_or_default(),
            notes: self.notes,
            created_at: ts,
            updated_at: ts,
        })
    }

    pub fn apply(self, booking: &mut Booking) {
        if let Some(id) = self.student_id {
            booking.student_id = id;
        }
        if let Some(id) = self.teacher_id {
            booking.teacher_id = id;
        }
        if let Some(id) = self.lesson_id {
            booking.lesson_id = id;
        }
        if let Some(at) = self.scheduled_at {
            booking.scheduled_at = at;
        }
        if let Some(status) = self.status {
            booking.status = status;
        }
        if self.notes.is_some() {
            booking.notes = self.notes;
        }
        booking.updated_at = now();
    }
}

/// Parse the body of a status change.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFields`] when absent and
/// [`ValidationError::InvalidStatus`] for unknown values.
pub fn parse_status(raw: Option<&str>) -> Result<BookingStatus, ValidationError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingFields(&["status"]))?
        .parse()
}

/// Booking counts for one lesson, taken after a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonBookingTally {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl LessonBookingTally {
    /// Count `statuses` of the bookings that belong to one lesson.
    pub fn from_statuses(statuses: impl IntoIterator<Item = BookingStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut tally, status| {
            tally.total += 1;
            if status.is_active() {
                tally.active += 1;
            }
            if status == BookingStatus::Completed {
                tally.completed += 1;
            }
            tally
        })
    }
}

/// Lesson status after a booking for it was created.
#[must_use]
pub fn lesson_status_after_create(lesson: LessonStatus) -> Option<LessonStatus> {
    (lesson == LessonStatus::Available).then_some(LessonStatus::Scheduled)
}

/// Lesson status after one of its bookings was deleted.
#[must_use]
pub fn lesson_status_after_delete(
    lesson: LessonStatus,
    remaining: LessonBookingTally,
) -> Option<LessonStatus> {
    (remaining.active == 0 && !lesson.is_closed() && lesson != LessonStatus::Available)
        .then_some(LessonStatus::Available)
}

/// Lesson status after one of its bookings moved from `previous` to `next`.
///
/// `tally` counts the lesson's bookings with the change already applied.
#[must_use]
pub fn lesson_status_after_change(
    lesson: LessonStatus,
    previous: BookingStatus,
    next: BookingStatus,
    tally: LessonBookingTally,
) -> Option<LessonStatus> {
    let target = match next {
        BookingStatus::Cancelled if tally.active == 0 => Some(LessonStatus::Available),
        BookingStatus::Completed if tally.total > 0 && tally.completed == tally.total => {
            Some(LessonStatus::Completed)
        }
        BookingStatus::Scheduled | BookingStatus::Confirmed
            if previous == BookingStatus::Cancelled =>
        {
            Some(LessonStatus::Scheduled)
        }
        _ => None,
    };
    target.filter(|target| *target != lesson)
}
