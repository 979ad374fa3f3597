//! Audit trail entries.
//!
//! # Invariants
//! - Entries are append-only: never updated, never deleted.
//! - `entity_name` uses the persisted table-level names below so existing
//!   audit history stays comparable.

use serde::{Deserialize, Serialize};

/// Store-assigned audit id (`audit_log.idAudit`).
pub type AuditId = i64;

pub const ENTITY_CATEGORY: &str = "Kategori";
pub const ENTITY_BOOK: &str = "Buku";
pub const ENTITY_PHYSICAL_COPY: &str = "BukuFisik";
pub const ENTITY_BOOK_AUTHOR: &str = "BukuPenulis";

/// Kind of mutation recorded by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Insert,
    Update,
    SoftDelete,
}

/// Persisted audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub entity_name: String,
    pub entity_id: i64,
    pub action: AuditAction,
    /// Unix epoch milliseconds, assigned by the store at append time.
    pub timestamp: i64,
    pub note: String,
}

/// Append draft; the store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub entity_name: &'static str,
    pub entity_id: i64,
    pub action: AuditAction,
    pub note: String,
}

impl NewAuditEntry {
    pub fn new(
        entity_name: &'static str,
        entity_id: i64,
        action: AuditAction,
        note: impl Into<String>,
    ) -> Self {
        Self {
            entity_name,
            entity_id,
            action,
            note: note.into(),
        }
    }
}
