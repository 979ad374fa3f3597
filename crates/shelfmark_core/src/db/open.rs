//! Connection bootstrap for catalog stores.
//!
//! # Responsibility
//! - Open a SQLite connection for a [`StoreLocation`].
//! - Configure pragmas the catalog relies on, then migrate.
//!
//! # Invariants
//! - `foreign_keys=ON` is set before migrations run, so referential checks
//!   cover every later write.
//! - A failed bootstrap never returns a half-configured connection.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Busy timeout applied when the caller does not configure one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a catalog store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// SQLite database file, created when missing.
    File(PathBuf),
    /// Private in-memory database, discarded on close.
    Memory,
}

impl StoreLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens a catalog database file with the default busy timeout.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_store(
        &StoreLocation::File(path.as_ref().to_path_buf()),
        DEFAULT_BUSY_TIMEOUT,
    )
}

/// Opens a fresh in-memory catalog with the default busy timeout.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_store(&StoreLocation::Memory, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a catalog store and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` start/ok/error events with duration.
pub fn open_store(location: &StoreLocation, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match location {
        StoreLocation::File(path) => Connection::open(path),
        StoreLocation::Memory => Connection::open_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    if let Err(err) = bootstrap_connection(&mut conn, busy_timeout) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}
