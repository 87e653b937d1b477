//! Registry commands.
//!
//! # Responsibility
//! - Turn registry service calls into textual reports.
//! - Render typed failures as `Error: <message>` lines on the error stream.
//!
//! # Invariants
//! - Commands never panic or abort on registry errors; they return
//!   `CommandStatus::Failure` after writing the error line.
//! - Nothing is written to the output stream when a command fails.
//! - An empty report writes nothing at all.

use crate::model::enrollment::parse_period_date;
use crate::model::validation::ValidationError;
use crate::repo::registry_repo::RepoError;
use chrono::NaiveDateTime;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

pub mod add;
pub mod enroll;
pub mod orgs;
pub mod rm;
pub mod show;

pub type CommandResult<T> = Result<T, CommandError>;

/// Failure reported by a command.
#[derive(Debug)]
pub enum CommandError {
    /// Requested entity is not in the registry.
    NotFound { entity: String },
    /// Entity to create is already in the registry.
    AlreadyExists { entity: String },
    /// User input was rejected before reaching the registry.
    InvalidValue(ValidationError),
    /// Storage or bootstrap failure.
    Repo(RepoError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity } => write!(f, "{entity} not found in the registry"),
            Self::AlreadyExists { entity } => {
                write!(f, "{entity} already exists in the registry")
            }
            Self::InvalidValue(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidValue(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } | Self::AlreadyExists { .. } => None,
        }
    }
}

impl From<RepoError> for CommandError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity } => Self::NotFound { entity },
            RepoError::AlreadyExists { entity } => Self::AlreadyExists { entity },
            RepoError::Validation(err) => Self::InvalidValue(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidValue(value)
    }
}

/// Outcome of running a command against output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
}

impl CommandStatus {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// Writes a command result to the given streams.
pub(crate) fn emit<O, E>(
    command: &'static str,
    result: CommandResult<String>,
    out: &mut O,
    err: &mut E,
) -> CommandStatus
where
    O: Write + ?Sized,
    E: Write + ?Sized,
{
    match result {
        Ok(report) => {
            if report.is_empty() {
                return CommandStatus::Success;
            }
            match writeln!(out, "{report}") {
                Ok(()) => CommandStatus::Success,
                Err(io_err) => {
                    error!(
                        "event=command_output module=command status=error command={command} error={io_err}"
                    );
                    CommandStatus::Failure
                }
            }
        }
        Err(command_err) => {
            info!(
                "event=command_run module=command status=error command={command} error={command_err}"
            );
            if let Err(io_err) = writeln!(err, "Error: {command_err}") {
                error!(
                    "event=command_output module=command status=error command={command} error={io_err}"
                );
            }
            CommandStatus::Failure
        }
    }
}

/// Parses an optional period bound given on the command line.
pub(crate) fn parse_optional_date(value: Option<&str>) -> CommandResult<Option<NaiveDateTime>> {
    value.map(parse_period_date).transpose().map_err(Into::into)
}
