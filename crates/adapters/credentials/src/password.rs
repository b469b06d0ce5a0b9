//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with salt and hash
//! in unpadded standard base64.
//!
//! Key derivation runs on the tokio blocking pool.

use std::future::Future;
use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};

use tutorhub_app::ports::PasswordHasher;
use tutorhub_domain::error::TutorHubError;

use crate::error::CredentialsError;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;
const DEFAULT_ITERATIONS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

#[derive(Clone)]
pub struct Pbkdf2Hasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl Pbkdf2Hasher {
    #[must_use]
    pub fn new(iterations: NonZeroU32) -> Self {
        Self {
            iterations,
            rng: SystemRandom::new(),
        }
    }
}

/// The parts of an encoded hash, if it is well formed.
fn parse(encoded: &str) -> Option<(NonZeroU32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<NonZeroU32>().ok()?;
    let salt = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    let hash = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((iterations, salt, hash))
}

impl Pbkdf2Hasher {
    fn hash_blocking(&self, password: &str) -> Result<String, CredentialsError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| CredentialsError::SaltGeneration)?;

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(hash),
        ))
    }
}

fn verify_blocking(password: &str, encoded: &str) -> bool {
    let Some((iterations, salt, hash)) = parse(encoded) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };
    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash(&self, password: &str) -> impl Future<Output = Result<String, TutorHubError>> + Send {
        let hasher = self.clone();
        let password = password.to_owned();
        async move {
            let encoded = tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
                .await
                .map_err(CredentialsError::Worker)??;
            Ok(encoded)
        }
    }

    fn verify(&self, password: &str, encoded: &str) -> impl Future<Output = bool> + Send {
        let password = password.to_owned();
        let encoded = encoded.to_owned();
        async move {
            tokio::task::spawn_blocking(move || verify_blocking(&password, &encoded))
                .await
                .unwrap_or_else(|err| {
                    tracing::error!(error = %err, "password check did not finish");
                    false
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Pbkdf2Hasher {
        // Low cost keeps the tests fast.
        Pbkdf2Hasher::new(NonZeroU32::new(1_000).unwrap())
    }

    #[tokio::test]
    async fn should_verify_password_when_hash_matches() {
        let hasher = hasher();
        let encoded = hasher.hash("hunter2").await.unwrap();
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(hasher.verify("hunter2", &encoded).await);
    }

    #[tokio::test]
    async fn should_reject_wrong_password() {
        let hasher = hasher();
        let encoded = hasher.hash("hunter2").await.unwrap();
        assert!(!hasher.verify("hunter3", &encoded).await);
    }

    #[tokio::test]
    async fn should_salt_every_hash() {
        let hasher = hasher();
        let first = hasher.hash("same").await.unwrap();
        let second = hasher.hash("same").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn should_verify_hash_made_with_other_iteration_count() {
        let encoded = hasher().hash("secret").await.unwrap();
        assert!(Pbkdf2Hasher::default().verify("secret", &encoded).await);
    }

    #[tokio::test]
    async fn should_never_verify_malformed_hash() {
        let hasher = hasher();
        for encoded in [
            "",
            "secret",
            "bcrypt$10$abc$def",
            "pbkdf2-sha256$0$abc$def",
            "pbkdf2-sha256$1000$***$def",
            "pbkdf2-sha256$1000$abc$def$extra",
        ] {
            assert!(!hasher.verify("secret", encoded).await, "{encoded}");
        }
    }

    #[tokio::test]
    async fn should_keep_runtime_responsive_while_hashing() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }
        });

        Pbkdf2Hasher::default().hash("secret").await.unwrap();
        let seen = ticks.load(Ordering::SeqCst);
        ticker.abort();
        assert!(seen > 0);
    }
}
