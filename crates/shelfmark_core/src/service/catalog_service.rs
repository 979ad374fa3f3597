//! Catalog use-case service.
//!
//! # Responsibility
//! - Single entry point for every catalog mutation.
//! - Validate input, run repository calls and the matching audit append in
//!   one store transaction, then refresh live queries.
//! - Own the store connection for its whole lifetime.
//!
//! # Invariants
//! - A mutation's entity writes and its audit entry commit together or not
//!   at all; any error drops the transaction before it reaches the caller.
//! - Category parent chains never loop back to the category being updated.
//! - A category with a copy on loan cannot be deleted.
//! - Books are only soft-deleted here.

use crate::config::CatalogConfig;
use crate::db::{open_store, DbError};
use crate::model::audit::{
    AuditAction, AuditEntry, NewAuditEntry, ENTITY_BOOK, ENTITY_BOOK_AUTHOR, ENTITY_CATEGORY,
    ENTITY_PHYSICAL_COPY,
};
use crate::model::author::{Author, AuthorId, BookAuthorLink, NewAuthor};
use crate::model::book::{Book, BookId, BookWithCategory, NewBook};
use crate::model::category::{Category, CategoryId, NewCategory};
use crate::model::copy::{CopyId, NewPhysicalCopy, PhysicalCopy};
use crate::model::ValidationError;
use crate::repo::audit_repo::{AuditRepository, SqliteAuditRepository};
use crate::repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
use crate::repo::book_repo::{BookRepository, SqliteBookRepository};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::copy_repo::{CopyRepository, SqliteCopyRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::live_query::{CatalogTable, LiveQuery, LiveQueryRegistry};
use log::{debug, error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Input rejected before touching the store.
    Validation(ValidationError),
    /// Update would make a category its own ancestor.
    CyclicReference {
        category_id: CategoryId,
        parent_id: CategoryId,
    },
    /// Category still has copies out on loan.
    CategoryInUse {
        category_id: CategoryId,
        loaned_copies: usize,
    },
    /// A referenced row does not exist.
    ReferentialIntegrity(String),
    /// Target row is absent or already soft-deleted.
    NotFound { entity: &'static str, id: i64 },
    /// Transaction, connection or decoding failure.
    Storage(RepoError),
}

impl CatalogError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::CyclicReference { .. } => "cyclic_reference",
            Self::CategoryInUse { .. } => "category_in_use",
            Self::ReferentialIntegrity(_) => "referential_integrity",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CyclicReference {
                category_id,
                parent_id,
            } => write!(
                f,
                "cyclic category reference: {category_id} cannot be placed under {parent_id}"
            ),
            Self::CategoryInUse {
                category_id,
                loaned_copies,
            } => write!(
                f,
                "category {category_id} has {loaned_copies} copies on loan and cannot be deleted"
            ),
            Self::ReferentialIntegrity(message) => {
                write!(f, "referenced row does not exist: {message}")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CatalogError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { table, id } => Self::NotFound { entity: table, id },
            RepoError::ForeignKey(message) => Self::ReferentialIntegrity(message),
            other => Self::Storage(other),
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        RepoError::from(value).into()
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

/// Catalog service facade over one owned store connection.
pub struct CatalogService {
    conn: Connection,
    live_queries: LiveQueryRegistry,
}

impl CatalogService {
    /// Wraps an already migrated connection (see [`crate::db::open_store`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            live_queries: LiveQueryRegistry::default(),
        }
    }

    /// Opens the configured store and takes ownership of it.
    pub fn open(config: &CatalogConfig) -> CatalogResult<Self> {
        let conn = open_store(&config.store, config.busy_timeout)?;
        Ok(Self::new(conn))
    }

    /// Closes the store. Live queries stop receiving snapshots.
    pub fn close(self) -> CatalogResult<()> {
        let Self { conn, live_queries } = self;
        info!(
            "event=catalog_close module=service status=start live_queries={}",
            live_queries.len()
        );
        drop(live_queries);
        conn.close().map_err(|(_, err)| {
            error!("event=catalog_close module=service status=error error={err}");
            CatalogError::from(err)
        })?;
        info!("event=catalog_close module=service status=ok");
        Ok(())
    }

    /// Read-only access to the owned connection for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates a category and its `Insert` audit entry.
    ///
    /// The audit entry records the store-assigned id.
    ///
    /// # Errors
    /// - `Validation` for a blank name.
    /// - `ReferentialIntegrity` when `parent_id` does not exist.
    /// - `CyclicReference` when `parent_id` names the id the row receives.
    pub fn create_category(&mut self, input: &NewCategory) -> CatalogResult<CategoryId> {
        input.validate()?;
        self.write(
            "create_category",
            &[CatalogTable::Category, CatalogTable::AuditLog],
            |conn| {
                let id = SqliteCategoryRepository::new(conn).insert(None, input)?;
                let id = expect_inserted("kategori", id)?;
                // The self FK is satisfied by the new row itself when the
                // requested parent turns out to be the assigned id.
                if input.parent_id == Some(id) {
                    return Err(CatalogError::CyclicReference {
                        category_id: id,
                        parent_id: id,
                    });
                }
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_CATEGORY,
                    id,
                    AuditAction::Insert,
                    format!("created category: {}", input.name),
                ))?;
                Ok(id)
            },
        )
    }

    /// Replaces a category row after name and hierarchy checks.
    ///
    /// The parent chain is walked inside the write transaction, re-reading
    /// each hop from the store.
    pub fn update_category(&mut self, category: &Category) -> CatalogResult<()> {
        category.validate()?;
        self.write(
            "update_category",
            &[CatalogTable::Category, CatalogTable::AuditLog],
            |conn| {
                let categories = SqliteCategoryRepository::new(conn);
                ensure_acyclic(&categories, category.id, category.parent_id)?;
                categories.update(category)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_CATEGORY,
                    category.id,
                    AuditAction::Update,
                    format!("updated category: {}", category.name),
                ))?;
                Ok(())
            },
        )
    }

    /// Soft-deletes a category.
    ///
    /// With `delete_books` its active books are soft-deleted too; otherwise
    /// they are detached and become uncategorized.
    ///
    /// # Errors
    /// - `CategoryInUse` when any copy of a book in the category is on loan.
    /// - `NotFound` when the category is absent or already deleted.
    pub fn delete_category(
        &mut self,
        category_id: CategoryId,
        delete_books: bool,
    ) -> CatalogResult<()> {
        self.write(
            "delete_category",
            &[
                CatalogTable::Category,
                CatalogTable::Book,
                CatalogTable::AuditLog,
            ],
            |conn| {
                let loaned = SqliteCopyRepository::new(conn).list_loaned_in_category(category_id)?;
                if !loaned.is_empty() {
                    return Err(CatalogError::CategoryInUse {
                        category_id,
                        loaned_copies: loaned.len(),
                    });
                }

                let categories = SqliteCategoryRepository::new(conn);
                let category =
                    categories
                        .get(category_id, false)?
                        .ok_or(CatalogError::NotFound {
                            entity: "kategori",
                            id: category_id,
                        })?;

                let books = SqliteBookRepository::new(conn);
                let affected = books.list_by_category(category_id)?;
                for book in &affected {
                    if delete_books {
                        books.soft_delete(book.id)?;
                    } else {
                        books.update(&Book {
                            category_id: None,
                            ..book.clone()
                        })?;
                    }
                }

                categories.soft_delete(category.id)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_CATEGORY,
                    category.id,
                    AuditAction::SoftDelete,
                    format!(
                        "deleted category: {}; books deleted: {delete_books}",
                        category.name
                    ),
                ))?;
                debug!(
                    "event=category_delete module=service status=ok category_id={category_id} books={} cascade={delete_books}",
                    affected.len()
                );
                Ok(())
            },
        )
    }

    /// Inserts a book and its `Insert` audit entry.
    ///
    /// # Errors
    /// - `Validation` for a blank title.
    /// - `ReferentialIntegrity` when `category_id` does not exist.
    pub fn insert_book(&mut self, input: &NewBook) -> CatalogResult<BookId> {
        input.validate()?;
        self.write(
            "insert_book",
            &[CatalogTable::Book, CatalogTable::AuditLog],
            |conn| {
                let id = SqliteBookRepository::new(conn).insert(None, input)?;
                let id = expect_inserted("buku", id)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_BOOK,
                    id,
                    AuditAction::Insert,
                    format!("created book: {}", input.title),
                ))?;
                Ok(id)
            },
        )
    }

    /// Replaces a book row.
    pub fn update_book(&mut self, book: &Book) -> CatalogResult<()> {
        book.validate()?;
        self.write(
            "update_book",
            &[CatalogTable::Book, CatalogTable::AuditLog],
            |conn| {
                SqliteBookRepository::new(conn).update(book)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_BOOK,
                    book.id,
                    AuditAction::Update,
                    format!("updated book: {}", book.title),
                ))?;
                Ok(())
            },
        )
    }

    /// Soft-deletes an active book. The row and its copies stay in place.
    pub fn delete_book(&mut self, book_id: BookId) -> CatalogResult<()> {
        self.write(
            "delete_book",
            &[CatalogTable::Book, CatalogTable::AuditLog],
            |conn| {
                let books = SqliteBookRepository::new(conn);
                let book = books.get(book_id, false)?.ok_or(CatalogError::NotFound {
                    entity: "buku",
                    id: book_id,
                })?;
                books.soft_delete(book.id)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_BOOK,
                    book.id,
                    AuditAction::SoftDelete,
                    format!("deleted book: {}", book.title),
                ))?;
                Ok(())
            },
        )
    }

    /// Inserts an author.
    ///
    /// Unlike every other mutation this neither validates the name nor
    /// writes an audit entry; the asymmetry is kept until product decides.
    pub fn insert_author(&mut self, input: &NewAuthor) -> CatalogResult<AuthorId> {
        self.write("insert_author", &[CatalogTable::Author], |conn| {
            let id = SqliteAuthorRepository::new(conn).insert(None, input)?;
            expect_inserted("penulis", id)
        })
    }

    /// Links an author to a book. Returns `false` when already linked.
    ///
    /// An audit entry is written only for a new link.
    pub fn link_author_to_book(
        &mut self,
        book_id: BookId,
        author_id: AuthorId,
    ) -> CatalogResult<bool> {
        self.write(
            "link_author_to_book",
            &[CatalogTable::BookAuthor, CatalogTable::AuditLog],
            |conn| {
                let linked = SqliteBookRepository::new(conn)
                    .link_author(BookAuthorLink { book_id, author_id })?;
                if linked {
                    SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                        ENTITY_BOOK_AUTHOR,
                        book_id,
                        AuditAction::Insert,
                        format!("linked author {author_id} to book {book_id}"),
                    ))?;
                }
                Ok(linked)
            },
        )
    }

    /// Registers a physical copy of a book.
    pub fn add_physical_copy(&mut self, input: &NewPhysicalCopy) -> CatalogResult<CopyId> {
        input.validate()?;
        self.write(
            "add_physical_copy",
            &[CatalogTable::PhysicalCopy, CatalogTable::AuditLog],
            |conn| {
                let id = SqliteCopyRepository::new(conn).insert(None, input)?;
                let id = expect_inserted("buku_fisik", id)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_PHYSICAL_COPY,
                    id,
                    AuditAction::Insert,
                    format!(
                        "added copy of book {} at {}",
                        input.book_id, input.shelf_location
                    ),
                ))?;
                Ok(id)
            },
        )
    }

    /// Replaces a physical copy row, e.g. to record a loan or return.
    pub fn update_physical_copy(&mut self, copy: &PhysicalCopy) -> CatalogResult<()> {
        copy.validate()?;
        self.write(
            "update_physical_copy",
            &[CatalogTable::PhysicalCopy, CatalogTable::AuditLog],
            |conn| {
                SqliteCopyRepository::new(conn).update(copy)?;
                SqliteAuditRepository::new(conn).append(&NewAuditEntry::new(
                    ENTITY_PHYSICAL_COPY,
                    copy.id,
                    AuditAction::Update,
                    format!(
                        "updated copy {} of book {}: {:?}, {:?}",
                        copy.id, copy.book_id, copy.condition, copy.loan_status
                    ),
                ))?;
                Ok(())
            },
        )
    }

    /// Active categories by name.
    pub fn get_all_categories(&mut self) -> CatalogResult<LiveQuery<Vec<Category>>> {
        self.subscribe("all_categories", &[CatalogTable::Category], |conn| {
            SqliteCategoryRepository::new(conn).list_active()
        })
    }

    /// One category, soft-deleted or not; `None` while the id is unknown.
    pub fn get_category(
        &mut self,
        category_id: CategoryId,
    ) -> CatalogResult<LiveQuery<Option<Category>>> {
        self.subscribe("category", &[CatalogTable::Category], move |conn| {
            SqliteCategoryRepository::new(conn).get(category_id, true)
        })
    }

    /// Active direct children of `parent_id`, by name.
    pub fn get_subcategories(
        &mut self,
        parent_id: CategoryId,
    ) -> CatalogResult<LiveQuery<Vec<Category>>> {
        self.subscribe("subcategories", &[CatalogTable::Category], move |conn| {
            SqliteCategoryRepository::new(conn).list_children(parent_id)
        })
    }

    /// Active books by title.
    pub fn get_all_books(&mut self) -> CatalogResult<LiveQuery<Vec<Book>>> {
        self.subscribe("all_books", &[CatalogTable::Book], |conn| {
            SqliteBookRepository::new(conn).list_active()
        })
    }

    /// Active books by title, each with its category resolved.
    pub fn get_all_books_with_category(
        &mut self,
    ) -> CatalogResult<LiveQuery<Vec<BookWithCategory>>> {
        self.subscribe(
            "all_books_with_category",
            &[CatalogTable::Book, CatalogTable::Category],
            |conn| SqliteBookRepository::new(conn).list_active_with_category(),
        )
    }

    /// One book, soft-deleted or not.
    pub fn get_book(&mut self, book_id: BookId) -> CatalogResult<LiveQuery<Option<Book>>> {
        self.subscribe("book", &[CatalogTable::Book], move |conn| {
            SqliteBookRepository::new(conn).get(book_id, true)
        })
    }

    /// Active books filed under `category_id`, by title.
    pub fn get_books_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> CatalogResult<LiveQuery<Vec<Book>>> {
        self.subscribe("books_by_category", &[CatalogTable::Book], move |conn| {
            SqliteBookRepository::new(conn).list_by_category(category_id)
        })
    }

    /// Active authors by name.
    pub fn get_all_authors(&mut self) -> CatalogResult<LiveQuery<Vec<Author>>> {
        self.subscribe("all_authors", &[CatalogTable::Author], |conn| {
            SqliteAuthorRepository::new(conn).list_active()
        })
    }

    /// One author, soft-deleted or not.
    pub fn get_author(
        &mut self,
        author_id: AuthorId,
    ) -> CatalogResult<LiveQuery<Option<Author>>> {
        self.subscribe("author", &[CatalogTable::Author], move |conn| {
            SqliteAuthorRepository::new(conn).get(author_id, true)
        })
    }

    /// Active authors linked to `book_id`, by name.
    pub fn get_authors_for_book(
        &mut self,
        book_id: BookId,
    ) -> CatalogResult<LiveQuery<Vec<Author>>> {
        self.subscribe(
            "authors_for_book",
            &[CatalogTable::BookAuthor, CatalogTable::Author],
            move |conn| SqliteBookRepository::new(conn).list_authors(book_id),
        )
    }

    /// Physical copies of `book_id`, by id.
    pub fn get_copies_for_book(
        &mut self,
        book_id: BookId,
    ) -> CatalogResult<LiveQuery<Vec<PhysicalCopy>>> {
        self.subscribe("copies_for_book", &[CatalogTable::PhysicalCopy], move |conn| {
            SqliteCopyRepository::new(conn).list_by_book(book_id)
        })
    }

    /// Full audit trail, newest first.
    pub fn get_all_audit_log(&mut self) -> CatalogResult<LiveQuery<Vec<AuditEntry>>> {
        self.subscribe("audit_log", &[CatalogTable::AuditLog], |conn| {
            SqliteAuditRepository::new(conn).list_recent()
        })
    }

    /// One-shot read of a category, soft-deleted or not.
    pub fn find_category(&self, category_id: CategoryId) -> CatalogResult<Option<Category>> {
        Ok(SqliteCategoryRepository::new(&self.conn).get(category_id, true)?)
    }

    /// One-shot read of a book, soft-deleted or not.
    pub fn find_book(&self, book_id: BookId) -> CatalogResult<Option<Book>> {
        Ok(SqliteBookRepository::new(&self.conn).get(book_id, true)?)
    }

    fn subscribe<T, F>(
        &mut self,
        name: &'static str,
        tables: &'static [CatalogTable],
        loader: F,
    ) -> CatalogResult<LiveQuery<T>>
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn(&Connection) -> RepoResult<T> + Send + 'static,
    {
        Ok(self
            .live_queries
            .subscribe(&self.conn, name, tables, loader)?)
    }

    /// Runs `body` in an immediate transaction and publishes `touched` on
    /// commit.
    fn write<T>(
        &mut self,
        op: &'static str,
        touched: &[CatalogTable],
        body: impl FnOnce(&Connection) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let value = match body(&tx) {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=catalog_write module=service status=error op={op} error_code=rollback_failed error={rollback_err}"
                    );
                }
                warn!(
                    "event=catalog_write module=service status=error op={op} duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                return Err(err);
            }
        };

        if let Err(err) = tx.commit() {
            let err = CatalogError::from(err);
            error!(
                "event=catalog_write module=service status=error op={op} duration_ms={} error_code=commit_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err);
        }

        info!(
            "event=catalog_write module=service status=ok op={op} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        self.live_queries.publish(&self.conn, touched);
        Ok(value)
    }
}

/// Walks the stored parent chain from `parent_id` up to a root.
///
/// Fails when the walk reaches `category_id` again, or when it runs into a
/// loop above it that never terminates.
fn ensure_acyclic(
    categories: &impl CategoryRepository,
    category_id: CategoryId,
    parent_id: Option<CategoryId>,
) -> CatalogResult<()> {
    let Some(first_parent) = parent_id else {
        return Ok(());
    };
    let cyclic = CatalogError::CyclicReference {
        category_id,
        parent_id: first_parent,
    };
    if first_parent == category_id {
        return Err(cyclic);
    }

    let mut visited = HashSet::new();
    let mut cursor = Some(first_parent);
    while let Some(current) = cursor {
        if current == category_id || !visited.insert(current) {
            return Err(cyclic);
        }
        cursor = categories.parent_link(current)?.ok_or_else(|| {
            CatalogError::ReferentialIntegrity(format!("parent category {current} does not exist"))
        })?;
    }
    Ok(())
}

fn expect_inserted(table: &'static str, id: Option<i64>) -> CatalogResult<i64> {
    // Auto-assigned ids cannot collide, so an ignored insert means the
    // store did not report the row.
    id.ok_or_else(|| {
        CatalogError::Storage(RepoError::InvalidData(format!(
            "insert into {table} reported no new row"
        )))
    })
}
