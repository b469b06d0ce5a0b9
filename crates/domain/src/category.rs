//! Category: a named grouping of lessons.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::CategoryId;
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Category {
    /// Create a category with a fresh id.
    ///
    /// # Errors
    ///
    /// See [`validate_name`].
    pub fn new(name: Option<&str>) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        let ts = now();
        Ok(Self {
            id: CategoryId::new(),
            name,
            created_at: ts,
            updated_at: ts,
        })
    }

    /// Rename the category.
    ///
    /// # Errors
    ///
    /// See [`validate_name`].
    pub fn rename(&mut self, name: Option<&str>) -> Result<(), ValidationError> {
        self.name = validate_name(name)?;
        self.updated_at = now();
        Ok(())
    }

    /// Case-insensitive name comparison used for uniqueness.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Trim a category name.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFields`] when absent and
/// [`ValidationError::EmptyName`] when blank.
pub fn validate_name(name: Option<&str>) -> Result<String, ValidationError> {
    let name = name.ok_or(ValidationError::MissingFields(&["name"]))?.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}
