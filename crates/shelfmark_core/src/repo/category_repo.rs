//! Category repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `kategori` plus the hierarchy lookups used by cycle checks.
//!
//! # Invariants
//! - Lists are ordered `nama ASC, idKategori ASC` and skip soft-deleted rows.
//! - `parent_link` reads the stored row regardless of its delete flag; the
//!   hierarchy walk must see every hop exactly as persisted.

use super::{bool_to_int, inserted_rowid, parse_flag, RepoError, RepoResult};
use crate::model::category::{Category, CategoryId, NewCategory};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TABLE: &str = "kategori";

const CATEGORY_SELECT_SQL: &str = "SELECT
    idKategori,
    nama,
    deskripsi,
    parentKategoriId,
    isDeleted
FROM kategori";

/// Data access contract for `kategori`.
pub trait CategoryRepository {
    /// Inserts one category; `Ok(None)` when `id` already exists.
    fn insert(
        &self,
        id: Option<CategoryId>,
        category: &NewCategory,
    ) -> RepoResult<Option<CategoryId>>;
    /// Replaces every column of an existing row.
    fn update(&self, category: &Category) -> RepoResult<()>;
    /// Removes the row. Catalog flows soft-delete instead.
    fn delete(&self, id: CategoryId) -> RepoResult<()>;
    fn get(&self, id: CategoryId, include_deleted: bool) -> RepoResult<Option<Category>>;
    /// Stored parent link of `id`; outer `None` when the row is absent.
    fn parent_link(&self, id: CategoryId) -> RepoResult<Option<Option<CategoryId>>>;
    fn list_active(&self) -> RepoResult<Vec<Category>>;
    fn list_children(&self, parent_id: CategoryId) -> RepoResult<Vec<Category>>;
    fn soft_delete(&self, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn insert(
        &self,
        id: Option<CategoryId>,
        category: &NewCategory,
    ) -> RepoResult<Option<CategoryId>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO kategori (
                idKategori,
                nama,
                deskripsi,
                parentKategoriId,
                isDeleted
            ) VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                id,
                category.name.as_str(),
                category.description.as_str(),
                category.parent_id,
            ],
        )?;
        Ok(inserted_rowid(self.conn, changed))
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE kategori
             SET
                nama = ?2,
                deskripsi = ?3,
                parentKategoriId = ?4,
                isDeleted = ?5
             WHERE idKategori = ?1;",
            params![
                category.id,
                category.name.as_str(),
                category.description.as_str(),
                category.parent_id,
                bool_to_int(category.is_deleted),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: TABLE,
                id: category.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM kategori WHERE idKategori = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { table: TABLE, id });
        }
        Ok(())
    }

    fn get(&self, id: CategoryId, include_deleted: bool) -> RepoResult<Option<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE idKategori = ?1
               AND (?2 = 1 OR isDeleted = 0);"
        ))?;
        let mut rows = stmt.query(params![id, bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn parent_link(&self, id: CategoryId) -> RepoResult<Option<Option<CategoryId>>> {
        let link = self
            .conn
            .query_row(
                "SELECT parentKategoriId FROM kategori WHERE idKategori = ?1;",
                [id],
                |row| row.get::<_, Option<CategoryId>>(0),
            )
            .optional()?;
        Ok(link)
    }

    fn list_active(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE isDeleted = 0
             ORDER BY nama ASC, idKategori ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn list_children(&self, parent_id: CategoryId) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE parentKategoriId = ?1
               AND isDeleted = 0
             ORDER BY nama ASC, idKategori ASC;"
        ))?;
        let mut rows = stmt.query([parent_id])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn soft_delete(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE kategori SET isDeleted = 1 WHERE idKategori = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { table: TABLE, id });
        }
        Ok(())
    }
}

pub(crate) fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    Ok(Category {
        id: row.get("idKategori")?,
        name: row.get("nama")?,
        description: row.get("deskripsi")?,
        parent_id: row.get("parentKategoriId")?,
        is_deleted: parse_flag(row.get("isDeleted")?, "kategori.isDeleted")?,
    })
}
