//! `add` command: registers one identity.

use super::{emit, CommandResult, CommandStatus};
use crate::repo::registry_repo::SqliteRegistryRepository;
use crate::service::registry_service::{AddIdentityRequest, RegistryService};
use rusqlite::Connection;
use std::io::Write;

pub struct Add<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Add<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Adds the identity and reports `New identity <id> added to <uuid>`.
    ///
    /// Re-adding an identity to its current owner reports
    /// `Identity <id> already belongs to <uuid>` instead.
    pub fn add(&self, request: &AddIdentityRequest) -> CommandResult<String> {
        let repo = SqliteRegistryRepository::try_new(self.conn)?;
        let added = RegistryService::new(repo).add_identity(request)?;

        if added.created {
            Ok(format!("New identity {} added to {}", added.id, added.uuid))
        } else {
            Ok(format!(
                "Identity {} already belongs to {}",
                added.id, added.uuid
            ))
        }
    }

    pub fn run<O, E>(&self, request: &AddIdentityRequest, out: &mut O, err: &mut E) -> CommandStatus
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        emit("add", self.add(request), out, err)
    }
}
