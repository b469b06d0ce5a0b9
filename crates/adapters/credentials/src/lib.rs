//! # tutorhub-adapter-credentials
//!
//! Implements the credential ports of `tutorhub-app`.
//!
//! ## Responsibilities
//! - Hash and verify passwords ([`Pbkdf2Hasher`], PBKDF2-HMAC-SHA256 via `ring`)
//! - Sign and check bearer tokens ([`JwtIssuer`], HS256 via `jsonwebtoken`)
//!
//! ## Dependency rule
//! Depends on `tutorhub-app` (for port traits) and `tutorhub-domain`.

mod error;
mod password;
mod token;

pub use error::CredentialsError;
pub use password::Pbkdf2Hasher;
pub use token::JwtIssuer;
