//! Brazilian postal codes (CEP) and the addresses registered under them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An eight-digit postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Keep the digits of `raw`, so `01001-000` and `01001000` are the same
    /// code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPostalCode`] unless exactly eight
    /// digits remain.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == 8 {
            Ok(Self(digits))
        } else {
            Err(ValidationError::InvalidPostalCode)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The street-level address of a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub postal_code: String,
    pub street: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
}
