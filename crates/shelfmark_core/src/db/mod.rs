//! SQLite store bootstrap for the catalog.
//!
//! # Responsibility
//! - Open file-backed or in-memory catalog stores.
//! - Apply schema migrations before any catalog row is touched.
//!
//! # Invariants
//! - Every connection handed out has `foreign_keys=ON`.
//! - Every connection handed out is at [`migrations::latest_version`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_store, StoreLocation, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating a catalog store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement or the connection itself.
    Sqlite(rusqlite::Error),
    /// The file carries a catalog schema this build cannot read.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "catalog store is at schema {found}, this build reads up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}
