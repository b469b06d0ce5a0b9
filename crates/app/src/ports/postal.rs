//! Postal code lookup port.

use std::future::Future;

use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::postal::{PostalAddress, PostalCode};

pub trait PostalCodeLookup {
    /// The address registered under `code`, or `None` when the code is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Upstream`] when the directory cannot answer.
    fn lookup(
        &self,
        code: &PostalCode,
    ) -> impl Future<Output = Result<Option<PostalAddress>, TutorHubError>> + Send;
}
