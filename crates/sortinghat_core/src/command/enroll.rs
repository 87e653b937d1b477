//! `enroll` and `withdraw` commands.
//!
//! Both take period bounds as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` text;
//! omitted bounds cover the whole supported period.

use super::{emit, parse_optional_date, CommandResult, CommandStatus};
use crate::repo::registry_repo::SqliteRegistryRepository;
use crate::service::registry_service::{EnrollmentRequest, RegistryService};
use rusqlite::Connection;
use std::io::Write;

/// Command-line shaped enrollment arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodArgs<'a> {
    pub uuid: &'a str,
    pub organization: &'a str,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
}

impl PeriodArgs<'_> {
    fn to_request(self) -> CommandResult<EnrollmentRequest> {
        Ok(EnrollmentRequest {
            uuid: self.uuid.to_string(),
            organization: self.organization.to_string(),
            start: parse_optional_date(self.from)?,
            end: parse_optional_date(self.to)?,
        })
    }
}

/// Enrolls a unique identity in an organization.
pub struct Enroll<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Enroll<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn enroll(&self, args: PeriodArgs<'_>) -> CommandResult<String> {
        let request = args.to_request()?;
        let repo = SqliteRegistryRepository::try_new(self.conn)?;
        RegistryService::new(repo).add_enrollment(&request)?;
        Ok(String::new())
    }

    pub fn run<O, E>(&self, args: PeriodArgs<'_>, out: &mut O, err: &mut E) -> CommandStatus
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        emit("enroll", self.enroll(args), out, err)
    }
}

/// Withdraws a unique identity from an organization within a period.
pub struct Withdraw<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Withdraw<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn withdraw(&self, args: PeriodArgs<'_>) -> CommandResult<String> {
        let request = args.to_request()?;
        let repo = SqliteRegistryRepository::try_new(self.conn)?;
        RegistryService::new(repo).delete_enrollment(&request)?;
        Ok(String::new())
    }

    pub fn run<O, E>(&self, args: PeriodArgs<'_>, out: &mut O, err: &mut E) -> CommandStatus
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        emit("withdraw", self.withdraw(args), out, err)
    }
}
