//! Registry store: SQLite bootstrap, schema migrations and bulk cleanup.
//!
//! # Responsibility
//! - Open and configure SQLite connections holding the registry.
//! - Apply schema migrations in deterministic order.
//! - Empty the whole registry on request.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Connections handed out have foreign keys enabled, so deletes cascade
//!   from unique identities and organizations to dependent rows.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod clear;
pub mod migrations;
mod open;

pub use clear::clear_registry;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "registry schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
