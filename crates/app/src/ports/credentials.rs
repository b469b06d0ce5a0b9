//! Credential ports: password hashing and bearer tokens.
//!
//! Password hashing is CPU-heavy and returns a future like the repositories.
//! Token signing stays synchronous.

use std::future::Future;

use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::identity::Identity;

pub trait PasswordHasher {
    /// Hash `password` with a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Internal`] if no salt could be generated.
    fn hash(&self, password: &str) -> impl Future<Output = Result<String, TutorHubError>> + Send;

    /// Check `password` against an encoded hash. Malformed hashes never verify.
    fn verify(&self, password: &str, encoded: &str) -> impl Future<Output = bool> + Send;
}

pub trait TokenIssuer {
    /// Sign a token carrying `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Internal`] if signing fails.
    fn issue(&self, identity: &Identity) -> Result<String, TutorHubError>;

    /// Decode and check a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`](tutorhub_domain::error::AuthError::InvalidToken)
    /// for bad signatures, malformed claims and expired tokens.
    fn verify(&self, token: &str) -> Result<Identity, TutorHubError>;
}
