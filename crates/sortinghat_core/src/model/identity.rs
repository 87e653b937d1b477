//! Identity and unique identity domain models.
//!
//! # Responsibility
//! - Define raw identities observed in data sources.
//! - Define the unique identity aggregate that groups them.
//! - Derive stable identity ids from identity data.
//!
//! # Invariants
//! - `Identity::id` is the SHA-1 hex digest of `source:email:name:username`,
//!   with absent fields hashed as empty strings.
//! - Empty optional fields are stored as `None`, never as `Some("")`.
//! - `source` is never empty and at least one data field is present.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::enrollment::Enrollment;
use super::validation::ValidationError;

/// Raw identity as observed in a data source (scm, its, mailing lists...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Content-derived identifier, see [`identity_id`].
    pub id: String,
    /// Unique identity this record belongs to.
    pub uuid: String,
    pub source: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
}

impl Identity {
    /// Builds a validated identity owned by `uuid` (trimmed).
    ///
    /// Blank `email`, `name` and `username` values are normalized to `None`
    /// before the id is derived.
    pub fn new(
        uuid: impl Into<String>,
        source: &str,
        email: Option<&str>,
        name: Option<&str>,
        username: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let email = normalize_field(email);
        let name = normalize_field(name);
        let username = normalize_field(username);

        let identity = Self {
            id: identity_id(
                source,
                email.as_deref(),
                name.as_deref(),
                username.as_deref(),
            )?,
            uuid: uuid.into().trim().to_string(),
            source: source.to_string(),
            email,
            name,
            username,
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Checks identity invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uuid.trim().is_empty() {
            return Err(ValidationError::EmptyUuid);
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::EmptySource);
        }
        if self.email.is_none() && self.name.is_none() && self.username.is_none() {
            return Err(ValidationError::MissingIdentityData);
        }
        Ok(())
    }
}

/// Derives the identity id for the given identity data.
///
/// The same digest is used as the uuid of the unique identity implicitly
/// created for a brand new identity.
pub fn identity_id(
    source: &str,
    email: Option<&str>,
    name: Option<&str>,
    username: Option<&str>,
) -> Result<String, ValidationError> {
    if source.trim().is_empty() {
        return Err(ValidationError::EmptySource);
    }

    let joined = [
        source,
        email.unwrap_or(""),
        name.unwrap_or(""),
        username.unwrap_or(""),
    ]
    .join(":");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn normalize_field(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Canonical person entity grouping identities and enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueIdentity {
    pub uuid: String,
    /// Ordered by name, username, email then source; absent values last.
    pub identities: Vec<Identity>,
    /// Ordered by organization name then start date.
    pub enrollments: Vec<Enrollment>,
}

impl UniqueIdentity {
    /// Creates an empty unique identity. Surrounding whitespace is trimmed.
    pub fn new(uuid: impl Into<String>) -> Result<Self, ValidationError> {
        let uuid = uuid.into().trim().to_string();
        if uuid.is_empty() {
            return Err(ValidationError::EmptyUuid);
        }
        Ok(Self {
            uuid,
            identities: Vec::new(),
            enrollments: Vec::new(),
        })
    }
}
