//! Registry use-case service.
//!
//! # Responsibility
//! - Provide the registry entry points used by commands: organizations,
//!   unique identities, identities and enrollments.
//! - Derive identity ids and apply enrollment period defaults.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Re-adding an identity to the unique identity that already owns it is a
//!   no-op; adding it anywhere else is `AlreadyExists`.

use crate::model::enrollment::{period_max, period_min, Enrollment};
use crate::model::identity::{identity_id, Identity, UniqueIdentity};
use crate::model::organization::Organization;
use crate::repo::registry_repo::{
    EnrollmentQuery, RegistryRepository, RepoError, RepoResult,
};
use chrono::NaiveDateTime;
use log::{debug, info};

/// Request model for registering one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddIdentityRequest {
    pub source: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    /// Existing unique identity to attach to. `None` creates a new one keyed
    /// by the identity id.
    pub uuid: Option<String>,
}

/// Outcome of [`RegistryService::add_identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedIdentity {
    pub id: String,
    /// Unique identity owning the identity.
    pub uuid: String,
    /// `false` when the identity already belonged to `uuid` and nothing was written.
    pub created: bool,
}

/// Request model for enrolling or withdrawing a unique identity.
///
/// Omitted bounds default to the full supported period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRequest {
    pub uuid: String,
    pub organization: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl EnrollmentRequest {
    pub fn new(uuid: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            organization: organization.into(),
            start: None,
            end: None,
        }
    }

    pub fn period(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Use-case service wrapper over a registry repository.
pub struct RegistryService<R: RegistryRepository> {
    repo: R,
}

impl<R: RegistryRepository> RegistryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add_organization(&self, name: &str) -> RepoResult<Organization> {
        let organization = Organization::new(name)?;
        self.repo.add_organization(&organization)?;
        info!(
            "event=organization_add module=service status=ok organization={}",
            organization.name
        );
        Ok(organization)
    }

    pub fn delete_organization(&self, name: &str) -> RepoResult<()> {
        self.repo.delete_organization(name)?;
        info!("event=organization_delete module=service status=ok organization={name}");
        Ok(())
    }

    /// Lists registered organizations, optionally filtered by a name substring.
    pub fn registry(&self, term: Option<&str>) -> RepoResult<Vec<Organization>> {
        self.repo.list_organizations(term)
    }

    pub fn add_unique_identity(&self, uuid: &str) -> RepoResult<()> {
        self.repo.add_unique_identity(uuid)?;
        info!("event=unique_identity_add module=service status=ok uuid={uuid}");
        Ok(())
    }

    pub fn delete_unique_identity(&self, uuid: &str) -> RepoResult<()> {
        self.repo.delete_unique_identity(uuid)?;
        info!("event=unique_identity_delete module=service status=ok uuid={uuid}");
        Ok(())
    }

    /// Registers an identity and reports where it landed.
    ///
    /// # Contract
    /// - Without `uuid`, the identity must be new and is attached to the
    ///   unique identity keyed by its id, which is created when missing.
    /// - With `uuid`, that unique identity must exist.
    pub fn add_identity(&self, request: &AddIdentityRequest) -> RepoResult<AddedIdentity> {
        let id = identity_id(
            &request.source,
            non_blank(request.email.as_deref()),
            non_blank(request.name.as_deref()),
            non_blank(request.username.as_deref()),
        )?;
        let requested_uuid = request.uuid.as_deref().map(str::trim);

        if let Some(existing) = self.repo.find_identity(&id)? {
            if requested_uuid == Some(existing.uuid.as_str()) {
                debug!(
                    "event=identity_add module=service status=skipped id={id} uuid={}",
                    existing.uuid
                );
                return Ok(AddedIdentity {
                    id,
                    uuid: existing.uuid,
                    created: false,
                });
            }
            return Err(RepoError::already_exists(id));
        }

        let identity = Identity::new(
            requested_uuid.unwrap_or(id.as_str()),
            &request.source,
            request.email.as_deref(),
            request.name.as_deref(),
            request.username.as_deref(),
        )?;
        match requested_uuid {
            Some(_) => self.repo.add_identity(&identity)?,
            None => self.repo.add_identity_with_unique_identity(&identity)?,
        }

        info!(
            "event=identity_add module=service status=ok id={} uuid={}",
            identity.id, identity.uuid
        );
        Ok(AddedIdentity {
            id: identity.id,
            uuid: identity.uuid,
            created: true,
        })
    }

    pub fn delete_identity(&self, id: &str) -> RepoResult<()> {
        self.repo.delete_identity(id)?;
        info!("event=identity_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn add_enrollment(&self, request: &EnrollmentRequest) -> RepoResult<Enrollment> {
        let enrollment = Enrollment::new(
            request.uuid.as_str(),
            request.organization.as_str(),
            request.start,
            request.end,
        )?;
        self.repo.add_enrollment(&enrollment)?;
        info!(
            "event=enrollment_add module=service status=ok uuid={} organization={}",
            enrollment.uuid, enrollment.organization
        );
        Ok(enrollment)
    }

    /// Removes the enrollments of `uuid` in `organization` within the period.
    ///
    /// Returns the number of removed enrollments.
    pub fn delete_enrollment(&self, request: &EnrollmentRequest) -> RepoResult<usize> {
        let removed = self.repo.delete_enrollments(
            &request.uuid,
            &request.organization,
            request.start.unwrap_or_else(period_min),
            request.end.unwrap_or_else(period_max),
        )?;
        info!(
            "event=enrollment_delete module=service status=ok uuid={} organization={} removed={removed}",
            request.uuid, request.organization
        );
        Ok(removed)
    }

    /// Returns every unique identity, or only `uuid` when given.
    pub fn unique_identities(&self, uuid: Option<&str>) -> RepoResult<Vec<UniqueIdentity>> {
        self.repo.list_unique_identities(uuid)
    }

    pub fn enrollments(&self, query: &EnrollmentQuery) -> RepoResult<Vec<Enrollment>> {
        self.repo.list_enrollments(query)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
