//! HS256 bearer tokens.

use chrono::TimeDelta;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use tutorhub_app::ports::TokenIssuer;
use tutorhub_domain::error::{AuthError, TutorHubError};
use tutorhub_domain::identity::{Identity, UserKind};
use tutorhub_domain::time::now;

use crate::error::CredentialsError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    name: String,
    kind: UserKind,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl JwtIssuer {
    /// Sign tokens with `secret`; each token is valid for `ttl`.
    #[must_use]
    pub fn new(secret: &str, ttl: TimeDelta) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, identity: &Identity) -> Result<String, TutorHubError> {
        let issued_at = now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            kind: identity.kind,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(CredentialsError::Signing)?;
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<Identity, TutorHubError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected bearer token");
                AuthError::InvalidToken
            })?;
        let claims = data.claims;
        let user_id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(Identity {
            user_id,
            email: claims.email,
            name: claims.name,
            kind: claims.kind,
        })
    }
}
