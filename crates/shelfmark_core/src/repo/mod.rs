//! Data access layer: one stateless adapter per catalog table.
//!
//! # Responsibility
//! - Keep SQL for the catalog tables behind typed repository traits.
//! - Translate SQLite failures into [`RepoError`] variants callers can match.
//!
//! # Invariants
//! - Adapters borrow a `&Connection` and never open transactions; a service
//!   passes its open `Transaction` (via deref) to compose several calls.
//! - Inserts ignore key conflicts and report them as `Ok(None)`.
//! - List queries exclude soft-deleted rows.

pub mod audit_repo;
pub mod author_repo;
pub mod book_repo;
pub mod category_repo;
pub mod copy_repo;

use crate::db::DbError;
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Data access error shared by every catalog repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Update/delete target row does not exist.
    NotFound { table: &'static str, id: i64 },
    /// Statement rejected by a foreign-key constraint.
    ForeignKey(String),
    /// Persisted row cannot be decoded into the model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "{table} row not found: {id}"),
            Self::ForeignKey(message) => write!(f, "foreign key violation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::ForeignKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_foreign_key_violation(&value) {
            let message = match value {
                rusqlite::Error::SqliteFailure(_, Some(message)) => message,
                _ => FOREIGN_KEY_FAILED.to_string(),
            };
            return Self::ForeignKey(message);
        }
        Self::Db(DbError::Sqlite(value))
    }
}

const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

/// Immediate FK checks report `SQLITE_CONSTRAINT_FOREIGNKEY`; `ON DELETE
/// RESTRICT` actions fire as `SQLITE_CONSTRAINT_TRIGGER` with the FK message.
fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => match code.extended_code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => true,
            ffi::SQLITE_CONSTRAINT_TRIGGER => message
                .as_deref()
                .is_some_and(|text| text.starts_with(FOREIGN_KEY_FAILED)),
            _ => false,
        },
        _ => false,
    }
}

/// Returns the new rowid when an `INSERT OR IGNORE` wrote a row.
fn inserted_rowid(conn: &Connection, changed: usize) -> Option<i64> {
    (changed > 0).then(|| conn.last_insert_rowid())
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
