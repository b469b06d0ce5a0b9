//! # tutorhub-adapter-postal-viacep
//!
//! Implements the `PostalCodeLookup` port of `tutorhub-app` against
//! [ViaCEP](https://viacep.com.br).
//!
//! ## Responsibilities
//! - Query `<base>/<cep>/json/` with a request timeout
//! - Translate ViaCEP's Portuguese field names into [`PostalAddress`](tutorhub_domain::postal::PostalAddress)
//! - Report unknown codes as `None` and transport or status failures as
//!   `UpstreamError`
//!
//! ## Dependency rule
//! Depends on `tutorhub-app` (for the port trait) and `tutorhub-domain`.

mod client;

pub use client::{DEFAULT_BASE_URL, ViaCepClient};
