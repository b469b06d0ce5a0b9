//! Rating: a student's score for a lesson they attended.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::id::{LessonId, RatingId, StudentId, TeacherId, parse_id};
use crate::input::{maybe_number, trimmed};
use crate::time::{Timestamp, now};

/// Inclusive bounds for a lesson score.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub teacher_id: TeacherId,
    pub score: f64,
    pub text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Check that `score` is a number within the accepted range.
///
/// # Errors
///
/// Returns [`ValidationError::ScoreOutOfRange`].
pub fn validate_score(score: &Value) -> Result<f64, ValidationError> {
    maybe_number(score)
        .filter(|s| (SCORE_MIN..=SCORE_MAX).contains(s))
        .ok_or(ValidationError::ScoreOutOfRange {
            min: SCORE_MIN,
            max: SCORE_MAX,
        })
}

/// Raw rating creation payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingInput {
    #[serde(default, deserialize_with = "trimmed")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub lesson_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub score: Value,
    pub text: Option<String>,
}

/// Validated rating, not yet checked against storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRating {
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub teacher_id: TeacherId,
    pub score: f64,
    pub text: Option<String>,
}

impl RatingInput {
    /// Check presence, id format and score range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`], [`ValidationError::InvalidId`]
    /// or [`ValidationError::ScoreOutOfRange`].
    pub fn validate(self) -> Result<NewRating, ValidationError> {
        let (Some(student_id), Some(lesson_id), Some(teacher_id)) =
            (self.student_id, self.lesson_id, self.teacher_id)
        else {
            return Err(ValidationError::MissingFields(&[
                "student_id",
                "lesson_id",
                "teacher_id",
                "score",
            ]));
        };
        if self.score.is_null() {
            return Err(ValidationError::MissingFields(&["score"]));
        }
        Ok(NewRating {
            student_id: parse_id(&student_id, "student_id")?,
            lesson_id: parse_id(&lesson_id, "lesson_id")?,
            teacher_id: parse_id(&teacher_id, "teacher_id")?,
            score: validate_score(&self.score)?,
            text: self.text,
        })
    }
}

impl NewRating {
    #[must_use]
    pub fn into_rating(self) -> Rating {
        let ts = now();
        Rating {
            id: RatingId::new(),
            student_id: self.student_id,
            lesson_id: self.lesson_id,
            teacher_id: self.teacher_id,
            score: self.score,
            text: self.text,
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// Rating update; only the score and text may change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingPatch {
    #[serde(default)]
    pub score: Value,
    pub text: Option<String>,
}

impl RatingPatch {
    /// Apply the patch to `rating`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFieldsToUpdate`] when neither field is
    /// present and [`ValidationError::ScoreOutOfRange`] for a bad score.
    pub fn apply(self, rating: &mut Rating) -> Result<(), ValidationError> {
        if self.score.is_null() && self.text.is_none() {
            return Err(ValidationError::NoFieldsToUpdate);
        }
        if !self.score.is_null() {
            rating.score = validate_score(&self.score)?;
        }
        if self.text.is_some() {
            rating.text = self.text;
        }
        rating.updated_at = now();
        Ok(())
    }
}

/// Aggregate over a set of ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RatingStats {
    pub total: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl RatingStats {
    /// Zeros when `scores` is empty; the average is rounded to 2 decimals.
    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Self {
        let mut stats = Self::default();
        let mut sum = 0.0;
        for score in scores {
            if stats.total == 0 {
                stats.min = score;
                stats.max = score;
            } else {
                stats.min = stats.min.min(score);
                stats.max = stats.max.max(score);
            }
            stats.total += 1;
            sum += score;
        }
        if stats.total > 0 {
            #[allow(clippy::cast_precision_loss)]
            let average = sum / stats.total as f64;
            stats.average = (average * 100.0).round() / 100.0;
        }
        stats
    }
}
