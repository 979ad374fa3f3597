//! Author repository contract and SQLite implementation.

use super::{bool_to_int, inserted_rowid, parse_flag, RepoError, RepoResult};
use crate::model::author::{Author, AuthorId, NewAuthor};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "penulis";

/// Data access contract for `penulis`.
pub trait AuthorRepository {
    /// Inserts one author; `Ok(None)` when `id` already exists.
    fn insert(&self, id: Option<AuthorId>, author: &NewAuthor) -> RepoResult<Option<AuthorId>>;
    fn update(&self, author: &Author) -> RepoResult<()>;
    fn get(&self, id: AuthorId, include_deleted: bool) -> RepoResult<Option<Author>>;
    /// Active authors ordered `nama ASC, idPenulis ASC`.
    fn list_active(&self) -> RepoResult<Vec<Author>>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn insert(&self, id: Option<AuthorId>, author: &NewAuthor) -> RepoResult<Option<AuthorId>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO penulis (idPenulis, nama, biografi, isDeleted)
             VALUES (?1, ?2, ?3, 0);",
            params![id, author.name.as_str(), author.biography.as_str()],
        )?;
        Ok(inserted_rowid(self.conn, changed))
    }

    fn update(&self, author: &Author) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE penulis
             SET nama = ?2, biografi = ?3, isDeleted = ?4
             WHERE idPenulis = ?1;",
            params![
                author.id,
                author.name.as_str(),
                author.biography.as_str(),
                bool_to_int(author.is_deleted),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: TABLE,
                id: author.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: AuthorId, include_deleted: bool) -> RepoResult<Option<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT idPenulis, nama, biografi, isDeleted
             FROM penulis
             WHERE idPenulis = ?1
               AND (?2 = 1 OR isDeleted = 0);",
        )?;
        let mut rows = stmt.query(params![id, bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_author_row(row)?));
        }
        Ok(None)
    }

    fn list_active(&self) -> RepoResult<Vec<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT idPenulis, nama, biografi, isDeleted
             FROM penulis
             WHERE isDeleted = 0
             ORDER BY nama ASC, idPenulis ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }
}

pub(crate) fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    Ok(Author {
        id: row.get("idPenulis")?,
        name: row.get("nama")?,
        biography: row.get("biografi")?,
        is_deleted: parse_flag(row.get("isDeleted")?, "penulis.isDeleted")?,
    })
}
