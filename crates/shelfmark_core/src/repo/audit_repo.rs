//! Append-only audit log repository.
//!
//! # Responsibility
//! - Append audit entries inside the caller's transaction.
//! - List the full trail newest first.
//!
//! # Invariants
//! - This contract has no update or delete; schema triggers reject both.
//! - Listing order is `timestamp DESC, idAudit DESC`, so entries appended in
//!   the same millisecond still come back newest first.

use super::{RepoError, RepoResult};
use crate::model::audit::{AuditAction, AuditEntry, AuditId, NewAuditEntry};
use rusqlite::{params, Connection, Row};

/// Data access contract for `audit_log`.
pub trait AuditRepository {
    fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditId>;
    fn list_recent(&self) -> RepoResult<Vec<AuditEntry>>;
}

/// SQLite-backed audit repository.
pub struct SqliteAuditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuditRepository for SqliteAuditRepository<'_> {
    fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditId> {
        self.conn.execute(
            "INSERT INTO audit_log (entityName, entityId, action, timestamp, catatan)
             VALUES (
                ?1,
                ?2,
                ?3,
                CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER),
                ?4
             );",
            params![
                entry.entity_name,
                entry.entity_id,
                action_to_db(entry.action),
                entry.note.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_recent(&self) -> RepoResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT idAudit, entityName, entityId, action, timestamp, catatan
             FROM audit_log
             ORDER BY timestamp DESC, idAudit DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_audit_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_audit_row(row: &Row<'_>) -> RepoResult<AuditEntry> {
    let action_text: String = row.get("action")?;
    let action = parse_action(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid action `{action_text}` in audit_log.action"))
    })?;

    Ok(AuditEntry {
        id: row.get("idAudit")?,
        entity_name: row.get("entityName")?,
        entity_id: row.get("entityId")?,
        action,
        timestamp: row.get("timestamp")?,
        note: row.get("catatan")?,
    })
}

fn action_to_db(action: AuditAction) -> &'static str {
    match action {
        AuditAction::Insert => "INSERT",
        AuditAction::Update => "UPDATE",
        AuditAction::SoftDelete => "SOFT_DELETE",
    }
}

fn parse_action(value: &str) -> Option<AuditAction> {
    match value {
        "INSERT" => Some(AuditAction::Insert),
        "UPDATE" => Some(AuditAction::Update),
        "SOFT_DELETE" => Some(AuditAction::SoftDelete),
        _ => None,
    }
}
