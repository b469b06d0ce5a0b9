//! Identity: who is calling, as asserted by a bearer token.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ForbiddenError, TutorHubError};
use crate::id::{StudentId, TeacherId, UserId};

/// Kind of account behind an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Student,
    Teacher,
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => f.write_str("student"),
            Self::Teacher => f.write_str("teacher"),
        }
    }
}

/// Claims carried by an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub kind: UserKind,
}

impl Identity {
    /// Return the caller's student id.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::WrongKind`] when the caller is a teacher.
    pub fn require_student(&self) -> Result<StudentId, TutorHubError> {
        match self.kind {
            UserKind::Student => Ok(self.user_id.into()),
            UserKind::Teacher => Err(ForbiddenError::WrongKind(UserKind::Student).into()),
        }
    }

    /// Return the caller's teacher id.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::WrongKind`] when the caller is a student.
    pub fn require_teacher(&self) -> Result<TeacherId, TutorHubError> {
        match self.kind {
            UserKind::Teacher => Ok(self.user_id.into()),
            UserKind::Student => Err(ForbiddenError::WrongKind(UserKind::Teacher).into()),
        }
    }

    /// Ensure the caller owns the profile identified by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::NotOwner`] when the ids differ.
    pub fn require_owner(&self, owner: impl Into<UserId>) -> Result<(), TutorHubError> {
        if self.user_id == owner.into() {
            Ok(())
        } else {
            Err(ForbiddenError::NotOwner.into())
        }
    }
}
