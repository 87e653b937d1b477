//! Organization domain model.

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Organization that unique identities can be enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Organization {
    /// Unique, case-sensitive name.
    pub name: String,
}

impl Organization {
    /// Creates an organization; surrounding whitespace is dropped.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyOrganizationName);
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}
