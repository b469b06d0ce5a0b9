use tutorhub_domain::error::TutorHubError;

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// The system random source failed.
    #[error("could not generate a password salt")]
    SaltGeneration,

    #[error("password worker failed: {0}")]
    Worker(#[source] tokio::task::JoinError),

    #[error("could not sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<CredentialsError> for TutorHubError {
    fn from(err: CredentialsError) -> Self {
        Self::Internal(Box::new(err))
    }
}
