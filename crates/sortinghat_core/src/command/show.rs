//! `show` command: prints unique identities with their identities and
//! enrollment history.
//!
//! Report layout, fields tab-separated and absent values printed as `-`:
//!
//! ```text
//! unique identity <uuid>
//!
//! Identities:
//!   <name>	<email>	<username>	<source>
//!
//! Enrollments:
//!   <organization>	<start>	<end>
//! ```
//!
//! `No identities` / `No enrollments` replace an empty section. Blocks are
//! separated by two blank lines.

use super::{emit, CommandResult, CommandStatus};
use crate::model::enrollment::{format_period_date, Enrollment};
use crate::model::identity::{Identity, UniqueIdentity};
use crate::repo::registry_repo::SqliteRegistryRepository;
use crate::service::registry_service::RegistryService;
use rusqlite::Connection;
use std::io::Write;

const EMPTY_FIELD: &str = "-";
const BLOCK_SEPARATOR: &str = "\n\n\n";

/// Read-only report over the registry.
pub struct Show<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Show<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Renders every unique identity, or only `uuid` when given.
    ///
    /// # Errors
    /// - `CommandError::NotFound` when `uuid` is not registered.
    pub fn show(&self, uuid: Option<&str>) -> CommandResult<String> {
        let repo = SqliteRegistryRepository::try_new(self.conn)?;
        let service = RegistryService::new(repo);
        let unique_identities = service.unique_identities(uuid)?;
        Ok(render_unique_identities(&unique_identities))
    }

    /// Runs [`Show::show`] and writes its outcome to the streams.
    pub fn run<O, E>(&self, uuid: Option<&str>, out: &mut O, err: &mut E) -> CommandStatus
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        emit("show", self.show(uuid), out, err)
    }
}

/// Renders unique identity blocks in the given order.
///
/// An empty slice renders as an empty string.
pub fn render_unique_identities(unique_identities: &[UniqueIdentity]) -> String {
    unique_identities
        .iter()
        .map(render_unique_identity)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

pub fn render_unique_identity(unique_identity: &UniqueIdentity) -> String {
    format!(
        "unique identity {}\n\n{}\n\n{}",
        unique_identity.uuid,
        render_identities(&unique_identity.identities),
        render_enrollments(&unique_identity.enrollments)
    )
}

fn render_identities(identities: &[Identity]) -> String {
    if identities.is_empty() {
        return "No identities".to_string();
    }

    let mut section = String::from("Identities:");
    for identity in identities {
        section.push_str(&format!(
            "\n  {}\t{}\t{}\t{}",
            field(identity.name.as_deref()),
            field(identity.email.as_deref()),
            field(identity.username.as_deref()),
            identity.source
        ));
    }
    section
}

fn render_enrollments(enrollments: &[Enrollment]) -> String {
    if enrollments.is_empty() {
        return "No enrollments".to_string();
    }

    let mut sorted = enrollments.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        a.organization
            .cmp(&b.organization)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });

    let mut section = String::from("Enrollments:");
    for enrollment in sorted {
        section.push_str(&format!(
            "\n  {}\t{}\t{}",
            enrollment.organization,
            format_period_date(&enrollment.start),
            format_period_date(&enrollment.end)
        ));
    }
    section
}

fn field(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => EMPTY_FIELD,
    }
}
