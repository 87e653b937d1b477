//! `orgs` command: lists, adds or deletes organizations.

use super::{emit, CommandResult, CommandStatus};
use crate::repo::registry_repo::SqliteRegistryRepository;
use crate::service::registry_service::RegistryService;
use rusqlite::Connection;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgsAction<'a> {
    /// One name per line, sorted; optional substring filter.
    List(Option<&'a str>),
    Add(&'a str),
    /// Also removes the organization's enrollments.
    Delete(&'a str),
}

pub struct Orgs<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Orgs<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Executes the action. Add and delete produce an empty report.
    pub fn orgs(&self, action: OrgsAction<'_>) -> CommandResult<String> {
        let repo = SqliteRegistryRepository::try_new(self.conn)?;
        let service = RegistryService::new(repo);
        match action {
            OrgsAction::List(term) => {
                let names = service
                    .registry(term)?
                    .into_iter()
                    .map(|organization| organization.name)
                    .collect::<Vec<_>>();
                Ok(names.join("\n"))
            }
            OrgsAction::Add(name) => {
                service.add_organization(name)?;
                Ok(String::new())
            }
            OrgsAction::Delete(name) => {
                service.delete_organization(name)?;
                Ok(String::new())
            }
        }
    }

    pub fn run<O, E>(&self, action: OrgsAction<'_>, out: &mut O, err: &mut E) -> CommandStatus
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        emit("orgs", self.orgs(action), out, err)
    }
}
