//! Registry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/delete/query APIs for organizations, unique identities,
//!   identities and enrollments.
//! - Keep SQL details and ordering rules inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Missing referenced entities surface as `RepoError::NotFound`, duplicates
//!   as `RepoError::AlreadyExists`, never as raw constraint failures.
//! - Unique identities are listed by uuid; identities by name, username,
//!   email, source (absent values last); enrollments by organization then
//!   period.
//! - Keys (uuids, identity ids, organization names) are matched after
//!   trimming surrounding whitespace, the same way they are stored.
//! - Multi-statement writes run in one immediate transaction.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::enrollment::{
    format_period_date, validate_period, Enrollment, PERIOD_FORMAT,
};
use crate::model::identity::{Identity, UniqueIdentity};
use crate::model::organization::Organization;
use crate::model::validation::ValidationError;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const IDENTITY_SELECT_SQL: &str = "SELECT
    id,
    uuid,
    source,
    email,
    name,
    username
FROM identities";

const IDENTITY_ORDER_SQL: &str = "ORDER BY
    name IS NULL, name,
    username IS NULL, username,
    email IS NULL, email,
    source";

const ENROLLMENT_SELECT_SQL: &str = "SELECT
    e.uuid AS uuid,
    o.name AS organization,
    e.start_date AS start_date,
    e.end_date AS end_date
FROM enrollments e
JOIN organizations o ON o.id = e.organization_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for registry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Named entity (uuid, identity id, organization...) does not exist.
    NotFound { entity: String },
    /// Named entity is already stored.
    AlreadyExists { entity: String },
    /// Connection schema is not at the version this repository expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    pub fn already_exists(entity: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity } => write!(f, "{entity} not found in the registry"),
            Self::AlreadyExists { entity } => {
                write!(f, "{entity} already exists in the registry")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "registry repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid registry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::AlreadyExists { .. }
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filters for listing enrollments. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentQuery {
    pub uuid: Option<String>,
    pub organization: Option<String>,
}

/// Repository interface for registry data.
pub trait RegistryRepository {
    fn add_organization(&self, organization: &Organization) -> RepoResult<()>;
    /// Deletes the organization and, by cascade, its enrollments.
    fn delete_organization(&self, name: &str) -> RepoResult<()>;
    /// Lists organizations sorted by name, optionally filtered by substring.
    fn list_organizations(&self, term: Option<&str>) -> RepoResult<Vec<Organization>>;

    fn add_unique_identity(&self, uuid: &str) -> RepoResult<()>;
    /// Deletes the unique identity with its identities and enrollments.
    fn delete_unique_identity(&self, uuid: &str) -> RepoResult<()>;
    fn unique_identity_exists(&self, uuid: &str) -> RepoResult<bool>;
    /// Lists every unique identity, or only `uuid` when given.
    fn list_unique_identities(&self, uuid: Option<&str>) -> RepoResult<Vec<UniqueIdentity>>;

    fn find_identity(&self, id: &str) -> RepoResult<Option<Identity>>;
    fn add_identity(&self, identity: &Identity) -> RepoResult<()>;
    /// Adds the identity, creating its owner unique identity when missing.
    ///
    /// Both inserts commit or roll back together.
    fn add_identity_with_unique_identity(&self, identity: &Identity) -> RepoResult<()>;
    fn delete_identity(&self, id: &str) -> RepoResult<()>;

    fn add_enrollment(&self, enrollment: &Enrollment) -> RepoResult<()>;
    /// Deletes `(uuid, organization)` enrollments lying inside `[from, to]`.
    ///
    /// Returns the number of removed rows.
    fn delete_enrollments(
        &self,
        uuid: &str,
        organization: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<usize>;
    fn list_enrollments(&self, query: &EnrollmentQuery) -> RepoResult<Vec<Enrollment>>;
}

/// SQLite-backed registry repository.
pub struct SqliteRegistryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistryRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn organization_id(&self, name: &str) -> RepoResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM organizations WHERE name = ?1;",
                [name.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn require_organization_id(&self, name: &str) -> RepoResult<i64> {
        self.organization_id(name)?
            .ok_or_else(|| RepoError::not_found(name.trim()))
    }

    fn require_unique_identity(&self, uuid: &str) -> RepoResult<()> {
        if self.unique_identity_exists(uuid)? {
            Ok(())
        } else {
            Err(RepoError::not_found(uuid.trim()))
        }
    }

    fn load_unique_identity(&self, uuid: String) -> RepoResult<UniqueIdentity> {
        let identities = self.list_identities(&uuid)?;
        let enrollments = self.list_enrollments(&EnrollmentQuery {
            uuid: Some(uuid.clone()),
            organization: None,
        })?;
        Ok(UniqueIdentity {
            uuid,
            identities,
            enrollments,
        })
    }

    fn list_identities(&self, uuid: &str) -> RepoResult<Vec<Identity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IDENTITY_SELECT_SQL}
             WHERE uuid = ?1
             {IDENTITY_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([uuid])?;
        let mut identities = Vec::new();
        while let Some(row) = rows.next()? {
            identities.push(parse_identity_row(row)?);
        }
        Ok(identities)
    }
}

impl RegistryRepository for SqliteRegistryRepository<'_> {
    fn add_organization(&self, organization: &Organization) -> RepoResult<()> {
        let organization = Organization::new(&organization.name)?;
        if self.organization_id(&organization.name)?.is_some() {
            return Err(RepoError::already_exists(organization.name));
        }

        self.conn.execute(
            "INSERT INTO organizations (name) VALUES (?1);",
            [organization.name.as_str()],
        )?;
        Ok(())
    }

    fn delete_organization(&self, name: &str) -> RepoResult<()> {
        let name = name.trim();
        let changed = self
            .conn
            .execute("DELETE FROM organizations WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::not_found(name));
        }
        Ok(())
    }

    fn list_organizations(&self, term: Option<&str>) -> RepoResult<Vec<Organization>> {
        let mut stmt = self.conn.prepare(
            "SELECT name
             FROM organizations
             WHERE ?1 IS NULL OR instr(name, ?1) > 0
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([term])?;
        let mut organizations = Vec::new();
        while let Some(row) = rows.next()? {
            organizations.push(Organization { name: row.get(0)? });
        }
        Ok(organizations)
    }

    fn add_unique_identity(&self, uuid: &str) -> RepoResult<()> {
        let unique_identity = UniqueIdentity::new(uuid)?;
        if self.unique_identity_exists(&unique_identity.uuid)? {
            return Err(RepoError::already_exists(unique_identity.uuid));
        }

        self.conn.execute(
            "INSERT INTO unique_identities (uuid) VALUES (?1);",
            [unique_identity.uuid.as_str()],
        )?;
        Ok(())
    }

    fn delete_unique_identity(&self, uuid: &str) -> RepoResult<()> {
        let uuid = uuid.trim();
        let changed = self
            .conn
            .execute("DELETE FROM unique_identities WHERE uuid = ?1;", [uuid])?;
        if changed == 0 {
            return Err(RepoError::not_found(uuid));
        }
        Ok(())
    }

    fn unique_identity_exists(&self, uuid: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM unique_identities WHERE uuid = ?1);",
            [uuid.trim()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_unique_identities(&self, uuid: Option<&str>) -> RepoResult<Vec<UniqueIdentity>> {
        let uuids = match uuid {
            Some(uuid) => {
                self.require_unique_identity(uuid)?;
                vec![uuid.trim().to_string()]
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT uuid FROM unique_identities ORDER BY uuid ASC;")?;
                let uuids = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                uuids
            }
        };

        uuids
            .into_iter()
            .map(|uuid| self.load_unique_identity(uuid))
            .collect()
    }

    fn find_identity(&self, id: &str) -> RepoResult<Option<Identity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IDENTITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_identity_row(row)?));
        }
        Ok(None)
    }

    fn add_identity(&self, identity: &Identity) -> RepoResult<()> {
        identity.validate()?;
        self.require_unique_identity(&identity.uuid)?;
        insert_identity(self.conn, identity)
    }

    fn add_identity_with_unique_identity(&self, identity: &Identity) -> RepoResult<()> {
        identity.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT OR IGNORE INTO unique_identities (uuid) VALUES (?1);",
            [identity.uuid.as_str()],
        )?;
        insert_identity(&tx, identity)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_identity(&self, id: &str) -> RepoResult<()> {
        let id = id.trim();
        let changed = self
            .conn
            .execute("DELETE FROM identities WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found(id));
        }
        Ok(())
    }

    fn add_enrollment(&self, enrollment: &Enrollment) -> RepoResult<()> {
        enrollment.validate()?;
        self.require_unique_identity(&enrollment.uuid)?;
        let organization_id = self.require_organization_id(&enrollment.organization)?;

        let start = format_period_date(&enrollment.start);
        let end = format_period_date(&enrollment.end);
        let duplicated: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM enrollments
                WHERE uuid = ?1
                  AND organization_id = ?2
                  AND start_date = ?3
                  AND end_date = ?4
            );",
            params![enrollment.uuid.as_str(), organization_id, start, end],
            |row| row.get(0),
        )?;
        if duplicated == 1 {
            return Err(RepoError::already_exists(format!(
                "enrollment of {} in {} from {start} to {end}",
                enrollment.uuid, enrollment.organization
            )));
        }

        self.conn.execute(
            "INSERT INTO enrollments (
                uuid,
                organization_id,
                start_date,
                end_date
            ) VALUES (?1, ?2, ?3, ?4);",
            params![enrollment.uuid.as_str(), organization_id, start, end],
        )?;
        Ok(())
    }

    fn delete_enrollments(
        &self,
        uuid: &str,
        organization: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<usize> {
        let uuid = uuid.trim();
        let organization = organization.trim();
        validate_period(from, to)?;
        self.require_unique_identity(uuid)?;
        let organization_id = self.require_organization_id(organization)?;

        let removed = self.conn.execute(
            "DELETE FROM enrollments
             WHERE uuid = ?1
               AND organization_id = ?2
               AND start_date >= ?3
               AND end_date <= ?4;",
            params![
                uuid,
                organization_id,
                format_period_date(&from),
                format_period_date(&to),
            ],
        )?;

        if removed == 0 {
            return Err(RepoError::not_found(format!(
                "enrollment of {uuid} in {organization}"
            )));
        }
        Ok(removed)
    }

    fn list_enrollments(&self, query: &EnrollmentQuery) -> RepoResult<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENROLLMENT_SELECT_SQL}
             WHERE (?1 IS NULL OR e.uuid = ?1)
               AND (?2 IS NULL OR o.name = ?2)
             ORDER BY e.uuid ASC, o.name ASC, e.start_date ASC, e.end_date ASC;"
        ))?;
        let mut rows = stmt.query(params![
            query.uuid.as_deref().map(str::trim),
            query.organization.as_deref().map(str::trim)
        ])?;
        let mut enrollments = Vec::new();
        while let Some(row) = rows.next()? {
            enrollments.push(parse_enrollment_row(row)?);
        }
        Ok(enrollments)
    }
}

fn insert_identity(conn: &Connection, identity: &Identity) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM identities WHERE id = ?1);",
        [identity.id.as_str()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        return Err(RepoError::already_exists(identity.id.as_str()));
    }

    conn.execute(
        "INSERT INTO identities (
            id,
            uuid,
            source,
            email,
            name,
            username
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            identity.id.as_str(),
            identity.uuid.as_str(),
            identity.source.as_str(),
            identity.email.as_deref(),
            identity.name.as_deref(),
            identity.username.as_deref(),
        ],
    )?;
    Ok(())
}

fn parse_identity_row(row: &Row<'_>) -> RepoResult<Identity> {
    let identity = Identity {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        source: row.get("source")?,
        email: row.get("email")?,
        name: row.get("name")?,
        username: row.get("username")?,
    };
    identity.validate().map_err(|err| {
        RepoError::InvalidData(format!("identity `{}` is invalid: {err}", identity.id))
    })?;
    Ok(identity)
}

fn parse_enrollment_row(row: &Row<'_>) -> RepoResult<Enrollment> {
    Ok(Enrollment {
        uuid: row.get("uuid")?,
        organization: row.get("organization")?,
        start: parse_stored_date(&row.get::<_, String>("start_date")?, "enrollments.start_date")?,
        end: parse_stored_date(&row.get::<_, String>("end_date")?, "enrollments.end_date")?,
    })
}

fn parse_stored_date(value: &str, column: &'static str) -> RepoResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, PERIOD_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}
