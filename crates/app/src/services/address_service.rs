//! Address service: resolve postal codes through the external directory.

use tutorhub_domain::error::{NotFoundError, TutorHubError};
use tutorhub_domain::postal::{PostalAddress, PostalCode};

use crate::ports::PostalCodeLookup;

pub struct AddressService<P> {
    lookup: P,
}

impl<P: PostalCodeLookup> AddressService<P> {
    pub fn new(lookup: P) -> Self {
        Self { lookup }
    }

    /// Resolve a postal code typed by a user, with or without its dash.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidPostalCode`](tutorhub_domain::error::ValidationError::InvalidPostalCode)
    ///   unless the input holds exactly eight digits. The directory is not
    ///   consulted then.
    /// - [`TutorHubError::NotFound`] when the directory does not know the code.
    /// - [`TutorHubError::Upstream`] when the directory cannot answer.
    #[tracing::instrument(skip(self))]
    pub async fn lookup(&self, raw: &str) -> Result<PostalAddress, TutorHubError> {
        let code = PostalCode::parse(raw)?;
        self.lookup.lookup(&code).await?.ok_or_else(|| {
            NotFoundError {
                entity: "PostalCode",
                id: code.to_string(),
            }
            .into()
        })
    }
}
