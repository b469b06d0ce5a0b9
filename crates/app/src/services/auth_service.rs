//! Auth service: password login and bearer-token verification.

use serde::Serialize;

use tutorhub_domain::error::{AuthError, TutorHubError, ValidationError};
use tutorhub_domain::identity::{Identity, UserKind};
use tutorhub_domain::profile::normalize_email;
use tutorhub_domain::student::Student;
use tutorhub_domain::teacher::Teacher;

use crate::ports::{PasswordHasher, StudentRepository, TeacherRepository, TokenIssuer};

/// The profile behind a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Account {
    Student(Student),
    Teacher(Teacher),
}

impl Account {
    #[must_use]
    pub fn kind(&self) -> UserKind {
        match self {
            Self::Student(_) => UserKind::Student,
            Self::Teacher(_) => UserKind::Teacher,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        let (user_id, profile) = match self {
            Self::Student(s) => (s.id.into(), &s.profile),
            Self::Teacher(t) => (t.id.into(), &t.profile),
        };
        Identity {
            user_id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            kind: self.kind(),
        }
    }

    fn password_hash(&self) -> Option<&str> {
        match self {
            Self::Student(s) => s.password_hash.as_deref(),
            Self::Teacher(t) => t.password_hash.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub access_token: String,
    pub user: Account,
    pub kind: UserKind,
}

pub struct AuthService<S, T, H, K> {
    students: S,
    teachers: T,
    hasher: H,
    tokens: K,
}

impl<S, T, H, K> AuthService<S, T, H, K>
where
    S: StudentRepository,
    T: TeacherRepository,
    H: PasswordHasher,
    K: TokenIssuer,
{
    pub fn new(students: S, teachers: T, hasher: H, tokens: K) -> Self {
        Self {
            students,
            teachers,
            hasher,
            tokens,
        }
    }

    /// Exchange an email and password for a bearer token.
    ///
    /// Students are tried before teachers; an account without a stored
    /// password never matches.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingCredentials`] when either field is
    /// blank and [`AuthError::InvalidCredentials`] when no account verifies.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Login, TutorHubError> {
        let email = email.map(normalize_email).filter(|e| !e.is_empty());
        let password = password.filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(ValidationError::MissingCredentials.into());
        };

        let mut candidates = Vec::with_capacity(2);
        if let Some(student) = self.students.find_by_email(&email).await? {
            candidates.push(Account::Student(student));
        }
        if let Some(teacher) = self.teachers.find_by_email(&email).await? {
            candidates.push(Account::Teacher(teacher));
        }

        let mut matched = None;
        for account in candidates {
            if let Some(hash) = account.password_hash()
                && self.hasher.verify(password, hash).await
            {
                matched = Some(account);
                break;
            }
        }
        let account = matched.ok_or(AuthError::InvalidCredentials)?;

        let access_token = self.tokens.issue(&account.identity())?;
        tracing::info!(kind = %account.kind(), "login succeeded");
        Ok(Login {
            access_token,
            kind: account.kind(),
            user: account,
        })
    }

    /// Decode a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for bad, forged or expired tokens.
    pub fn verify(&self, token: &str) -> Result<Identity, TutorHubError> {
        self.tokens.verify(token)
    }
}
