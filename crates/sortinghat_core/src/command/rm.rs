//! `rm` command: deletes a unique identity or a single identity.

use super::{emit, CommandResult, CommandStatus};
use crate::repo::registry_repo::SqliteRegistryRepository;
use crate::service::registry_service::RegistryService;
use rusqlite::Connection;
use std::io::Write;

/// What `rm` deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveTarget {
    /// Unique identity plus its identities and enrollments.
    UniqueIdentity,
    /// One identity; its unique identity is kept.
    Identity,
}

pub struct Remove<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Remove<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn remove(&self, id: &str, target: RemoveTarget) -> CommandResult<String> {
        let repo = SqliteRegistryRepository::try_new(self.conn)?;
        let service = RegistryService::new(repo);
        match target {
            RemoveTarget::UniqueIdentity => {
                service.delete_unique_identity(id)?;
                Ok(format!("Unique identity {id} removed"))
            }
            RemoveTarget::Identity => {
                service.delete_identity(id)?;
                Ok(format!("Identity {id} removed"))
            }
        }
    }

    pub fn run<O, E>(&self, id: &str, target: RemoveTarget, out: &mut O, err: &mut E) -> CommandStatus
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        emit("rm", self.remove(id, target), out, err)
    }
}
