//! Teacher: a tutor profile that owns lessons.

use serde::{Deserialize, Serialize};

use crate::id::TeacherId;
use crate::input::trimmed;
use crate::profile::{Profile, ProfilePatch};
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(flatten)]
    pub profile: Profile,
    /// Credit balance; only ever changed server-side.
    #[serde(default)]
    pub balance: f64,
    pub academic_background: Option<String>,
    pub area: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Teacher {
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        Self::with_id(TeacherId::new(), profile)
    }

    #[must_use]
    pub fn with_id(id: TeacherId, profile: Profile) -> Self {
        let ts = now();
        Self {
            id,
            profile,
            balance: 0.0,
            academic_background: None,
            area: None,
            password_hash: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// Texts searched by a free-text `q` filter.
    pub fn search_texts(&self) -> impl Iterator<Item = &str> {
        self.profile
            .search_texts()
            .chain(self.academic_background.as_deref())
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Partial update of a teacher. `email` and `balance` are not updatable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherPatch {
    #[serde(flatten)]
    pub profile: ProfilePatch,
    #[serde(default, deserialize_with = "trimmed")]
    pub academic_background: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub area: Option<String>,
}

impl TeacherPatch {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.profile.has_changes() || self.academic_background.is_some() || self.area.is_some()
    }

    pub fn apply(self, teacher: &mut Teacher) {
        self.profile.apply(&mut teacher.profile);
        if self.academic_background.is_some() {
            teacher.academic_background = self.academic_background;
        }
        if self.area.is_some() {
            teacher.area = self.area;
        }
    }
}

/// Registration payload for a teacher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTeacher {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub patch: TeacherPatch,
}

/// Does `name` contain every word of `words`, in order, ignoring case?
#[must_use]
pub fn name_matches_words(name: &str, words: &[&str]) -> bool {
    let name = name.to_lowercase();
    let mut rest = name.as_str();
    for word in words {
        let word = word.to_lowercase();
        match rest.find(&word) {
            Some(at) => rest = &rest[at + word.len()..],
            None => return false,
        }
    }
    !words.is_empty()
}
