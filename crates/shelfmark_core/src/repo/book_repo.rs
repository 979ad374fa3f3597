//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `buku` and the `buku_penulis_cross_ref` link table.
//! - Book/category projection for catalog list views.
//!
//! # Invariants
//! - `buku.idKategori` is checked by the store; a dangling id surfaces as
//!   [`RepoError::ForeignKey`].
//! - Lists are ordered `judul ASC, idBuku ASC` and skip soft-deleted books.

use super::author_repo::parse_author_row;
use super::category_repo::parse_category_row;
use super::{bool_to_int, inserted_rowid, parse_flag, RepoError, RepoResult};
use crate::model::author::{Author, BookAuthorLink};
use crate::model::book::{Book, BookId, BookWithCategory, NewBook};
use crate::model::category::CategoryId;
use rusqlite::{params, Connection, Row};

const TABLE: &str = "buku";

const BOOK_SELECT_SQL: &str = "SELECT
    idBuku,
    judul,
    deskripsi,
    tanggalTerbit,
    idKategori,
    isDeleted
FROM buku";

/// Data access contract for `buku` and its author links.
pub trait BookRepository {
    /// Inserts one book; `Ok(None)` when `id` already exists.
    fn insert(&self, id: Option<BookId>, book: &NewBook) -> RepoResult<Option<BookId>>;
    /// Replaces every column of an existing row.
    fn update(&self, book: &Book) -> RepoResult<()>;
    /// Removes the row and, by cascade, its physical copies.
    fn delete(&self, id: BookId) -> RepoResult<()>;
    fn get(&self, id: BookId, include_deleted: bool) -> RepoResult<Option<Book>>;
    fn list_active(&self) -> RepoResult<Vec<Book>>;
    fn list_active_with_category(&self) -> RepoResult<Vec<BookWithCategory>>;
    fn list_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<Book>>;
    fn soft_delete(&self, id: BookId) -> RepoResult<()>;
    /// Writes a link row; `Ok(false)` when the link already exists.
    fn link_author(&self, link: BookAuthorLink) -> RepoResult<bool>;
    /// Active authors linked to `book_id`, by name.
    fn list_authors(&self, book_id: BookId) -> RepoResult<Vec<Author>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_books(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }
        Ok(books)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn insert(&self, id: Option<BookId>, book: &NewBook) -> RepoResult<Option<BookId>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO buku (
                idBuku,
                judul,
                deskripsi,
                tanggalTerbit,
                idKategori,
                isDeleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                id,
                book.title.as_str(),
                book.description.as_str(),
                book.publication_date.as_str(),
                book.category_id,
            ],
        )?;
        Ok(inserted_rowid(self.conn, changed))
    }

    fn update(&self, book: &Book) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE buku
             SET
                judul = ?2,
                deskripsi = ?3,
                tanggalTerbit = ?4,
                idKategori = ?5,
                isDeleted = ?6
             WHERE idBuku = ?1;",
            params![
                book.id,
                book.title.as_str(),
                book.description.as_str(),
                book.publication_date.as_str(),
                book.category_id,
                bool_to_int(book.is_deleted),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: TABLE,
                id: book.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: BookId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM buku WHERE idBuku = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { table: TABLE, id });
        }
        Ok(())
    }

    fn get(&self, id: BookId, include_deleted: bool) -> RepoResult<Option<Book>> {
        let books = self.query_books(
            &format!(
                "{BOOK_SELECT_SQL}
                 WHERE idBuku = ?1
                   AND (?2 = 1 OR isDeleted = 0);"
            ),
            params![id, bool_to_int(include_deleted)],
        )?;
        Ok(books.into_iter().next())
    }

    fn list_active(&self) -> RepoResult<Vec<Book>> {
        self.query_books(
            &format!(
                "{BOOK_SELECT_SQL}
                 WHERE isDeleted = 0
                 ORDER BY judul ASC, idBuku ASC;"
            ),
            [],
        )
    }

    fn list_active_with_category(&self) -> RepoResult<Vec<BookWithCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                b.idBuku AS idBuku,
                b.judul AS judul,
                b.deskripsi AS bukuDeskripsi,
                b.tanggalTerbit AS tanggalTerbit,
                b.idKategori AS bukuIdKategori,
                b.isDeleted AS bukuIsDeleted,
                k.idKategori AS idKategori,
                k.nama AS nama,
                k.deskripsi AS deskripsi,
                k.parentKategoriId AS parentKategoriId,
                k.isDeleted AS isDeleted
             FROM buku b
             LEFT JOIN kategori k ON k.idKategori = b.idKategori
             WHERE b.isDeleted = 0
             ORDER BY b.judul ASC, b.idBuku ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let book = Book {
                id: row.get("idBuku")?,
                title: row.get("judul")?,
                description: row.get("bukuDeskripsi")?,
                publication_date: row.get("tanggalTerbit")?,
                category_id: row.get("bukuIdKategori")?,
                is_deleted: parse_flag(row.get("bukuIsDeleted")?, "buku.isDeleted")?,
            };
            let category = match row.get::<_, Option<CategoryId>>("idKategori")? {
                Some(_) => Some(parse_category_row(row)?),
                None => None,
            };
            items.push(BookWithCategory { book, category });
        }
        Ok(items)
    }

    fn list_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<Book>> {
        self.query_books(
            &format!(
                "{BOOK_SELECT_SQL}
                 WHERE idKategori = ?1
                   AND isDeleted = 0
                 ORDER BY judul ASC, idBuku ASC;"
            ),
            [category_id],
        )
    }

    fn soft_delete(&self, id: BookId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE buku SET isDeleted = 1 WHERE idBuku = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { table: TABLE, id });
        }
        Ok(())
    }

    fn link_author(&self, link: BookAuthorLink) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO buku_penulis_cross_ref (idBuku, idPenulis)
             VALUES (?1, ?2);",
            params![link.book_id, link.author_id],
        )?;
        Ok(changed > 0)
    }

    fn list_authors(&self, book_id: BookId) -> RepoResult<Vec<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.idPenulis AS idPenulis,
                p.nama AS nama,
                p.biografi AS biografi,
                p.isDeleted AS isDeleted
             FROM buku_penulis_cross_ref x
             INNER JOIN penulis p ON p.idPenulis = x.idPenulis
             WHERE x.idBuku = ?1
               AND p.isDeleted = 0
             ORDER BY p.nama ASC, p.idPenulis ASC;",
        )?;
        let mut rows = stmt.query([book_id])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    Ok(Book {
        id: row.get("idBuku")?,
        title: row.get("judul")?,
        description: row.get("deskripsi")?,
        publication_date: row.get("tanggalTerbit")?,
        category_id: row.get("idKategori")?,
        is_deleted: parse_flag(row.get("isDeleted")?, "buku.isDeleted")?,
    })
}
