//! Transactional core of the shelfmark library catalog.
//!
//! Categories, books, physical copies, authors and the audit trail live in
//! one SQLite store owned by [`CatalogService`]; this crate is the single
//! place their invariants are enforced.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, open_store, DbError, StoreLocation};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::audit::{AuditAction, AuditEntry};
pub use model::author::{Author, AuthorId, BookAuthorLink, NewAuthor};
pub use model::book::{Book, BookId, BookWithCategory, NewBook};
pub use model::category::{Category, CategoryId, NewCategory};
pub use model::copy::{CopyCondition, CopyId, LoanStatus, NewPhysicalCopy, PhysicalCopy};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::{CatalogError, CatalogResult, CatalogService};
pub use service::live_query::{CatalogTable, LiveQuery};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
