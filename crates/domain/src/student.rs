//! Student: a learner profile.

use serde::{Deserialize, Serialize};

use crate::error::{TutorHubError, ValidationError};
use crate::id::{StudentId, UserId};
use crate::input::string_list;
use crate::profile::{Profile, ProfilePatch};
use crate::time::{Timestamp, now};

/// Lowest and highest score accepted in a profile review.
pub const REVIEW_SCORE_RANGE: (u8, u8) = (1, 5);

/// A review left on a student's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReview {
    pub author_id: Option<UserId>,
    pub score: u8,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub wants_to_learn: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<ProfileReview>,
    pub average_rating: Option<f64>,
    /// Never serialized; the storage adapter keeps it in its own column.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Student {
    /// Create a student with a fresh id from a validated profile.
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        Self::with_id(StudentId::new(), profile)
    }

    #[must_use]
    pub fn with_id(id: StudentId, profile: Profile) -> Self {
        let ts = now();
        Self {
            id,
            profile,
            wants_to_learn: Vec::new(),
            interests: Vec::new(),
            reviews: Vec::new(),
            average_rating: None,
            password_hash: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// Append a review and recompute [`average_rating`](Self::average_rating).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] when `score` is not
    /// within `1..=5`.
    pub fn add_review(
        &mut self,
        score: u8,
        comment: Option<String>,
        author_id: Option<UserId>,
    ) -> Result<f64, TutorHubError> {
        let (min, max) = REVIEW_SCORE_RANGE;
        if !(min..=max).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange {
                min: f64::from(min),
                max: f64::from(max),
            }
            .into());
        }
        self.reviews.push(ProfileReview {
            author_id,
            score,
            comment,
            created_at: now(),
        });
        let sum: f64 = self.reviews.iter().map(|r| f64::from(r.score)).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = round2(sum / self.reviews.len() as f64);
        self.average_rating = Some(average);
        Ok(average)
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Partial update of a student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
    #[serde(flatten)]
    pub profile: ProfilePatch,
    #[serde(default, deserialize_with = "string_list")]
    pub wants_to_learn: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub interests: Option<Vec<String>>,
}

impl StudentPatch {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.profile.has_changes() || self.wants_to_learn.is_some() || self.interests.is_some()
    }

    /// Copy every present plain field onto `student`.
    pub fn apply(self, student: &mut Student) {
        self.profile.apply(&mut student.profile);
        if let Some(list) = self.wants_to_learn {
            student.wants_to_learn = list;
        }
        if let Some(list) = self.interests {
            student.interests = list;
        }
    }
}

/// Registration payload for a student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudent {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub patch: StudentPatch,
}
