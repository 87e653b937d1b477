//! Core of the SortingHat identity registry.
//!
//! Stores contributor identities, groups the ones belonging to the same
//! person under unique identities, tracks their organization enrollments and
//! renders registry reports for the command line.

pub mod command;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use command::add::Add;
pub use command::enroll::{Enroll, PeriodArgs, Withdraw};
pub use command::orgs::{Orgs, OrgsAction};
pub use command::rm::{Remove, RemoveTarget};
pub use command::show::{render_unique_identities, render_unique_identity, Show};
pub use command::{CommandError, CommandResult, CommandStatus};
pub use config::{ConfigError, SortingHatConfig};
pub use logging::{flush_logging, init_logging, logging_status, LogTarget, LoggingError};
pub use model::enrollment::{parse_period_date, period_max, period_min, Enrollment};
pub use model::identity::{identity_id, Identity, UniqueIdentity};
pub use model::organization::Organization;
pub use model::validation::ValidationError;
pub use repo::registry_repo::{
    EnrollmentQuery, RegistryRepository, RepoError, RepoResult, SqliteRegistryRepository,
};
pub use service::registry_service::{
    AddIdentityRequest, AddedIdentity, EnrollmentRequest, RegistryService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
