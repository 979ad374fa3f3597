//! Physical copy repository contract and SQLite implementation.
//!
//! # Invariants
//! - `kondisi` and `statusPeminjaman` keep their persisted text encodings
//!   (`Baik|Rusak`, `Tersedia|Dipinjam|Hilang`).
//! - Unknown encodings are rejected as invalid data, never defaulted.

use super::{inserted_rowid, RepoError, RepoResult};
use crate::model::book::BookId;
use crate::model::category::CategoryId;
use crate::model::copy::{CopyCondition, CopyId, LoanStatus, NewPhysicalCopy, PhysicalCopy};
use rusqlite::{params, Connection, Row};

const TABLE: &str = "buku_fisik";

const COPY_SELECT_SQL: &str = "SELECT
    idBukuFisik,
    idBuku,
    kondisi,
    statusPeminjaman,
    lokasiRak
FROM buku_fisik";

/// Data access contract for `buku_fisik`.
pub trait CopyRepository {
    /// Inserts one copy; `Ok(None)` when `id` already exists.
    fn insert(&self, id: Option<CopyId>, copy: &NewPhysicalCopy) -> RepoResult<Option<CopyId>>;
    fn update(&self, copy: &PhysicalCopy) -> RepoResult<()>;
    fn delete(&self, id: CopyId) -> RepoResult<()>;
    fn get(&self, id: CopyId) -> RepoResult<Option<PhysicalCopy>>;
    fn list_by_book(&self, book_id: BookId) -> RepoResult<Vec<PhysicalCopy>>;
    /// Copies on loan whose book is filed under `category_id`, deleted books
    /// included.
    fn list_loaned_in_category(&self, category_id: CategoryId) -> RepoResult<Vec<PhysicalCopy>>;
}

/// SQLite-backed physical copy repository.
pub struct SqliteCopyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCopyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_copies(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<PhysicalCopy>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut copies = Vec::new();
        while let Some(row) = rows.next()? {
            copies.push(parse_copy_row(row)?);
        }
        Ok(copies)
    }
}

impl CopyRepository for SqliteCopyRepository<'_> {
    fn insert(&self, id: Option<CopyId>, copy: &NewPhysicalCopy) -> RepoResult<Option<CopyId>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO buku_fisik (
                idBukuFisik,
                idBuku,
                kondisi,
                statusPeminjaman,
                lokasiRak
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id,
                copy.book_id,
                condition_to_db(copy.condition),
                loan_status_to_db(copy.loan_status),
                copy.shelf_location.as_str(),
            ],
        )?;
        Ok(inserted_rowid(self.conn, changed))
    }

    fn update(&self, copy: &PhysicalCopy) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE buku_fisik
             SET
                idBuku = ?2,
                kondisi = ?3,
                statusPeminjaman = ?4,
                lokasiRak = ?5
             WHERE idBukuFisik = ?1;",
            params![
                copy.id,
                copy.book_id,
                condition_to_db(copy.condition),
                loan_status_to_db(copy.loan_status),
                copy.shelf_location.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                table: TABLE,
                id: copy.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: CopyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM buku_fisik WHERE idBukuFisik = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { table: TABLE, id });
        }
        Ok(())
    }

    fn get(&self, id: CopyId) -> RepoResult<Option<PhysicalCopy>> {
        let copies =
            self.query_copies(&format!("{COPY_SELECT_SQL} WHERE idBukuFisik = ?1;"), [id])?;
        Ok(copies.into_iter().next())
    }

    fn list_by_book(&self, book_id: BookId) -> RepoResult<Vec<PhysicalCopy>> {
        self.query_copies(
            &format!(
                "{COPY_SELECT_SQL}
                 WHERE idBuku = ?1
                 ORDER BY idBukuFisik ASC;"
            ),
            [book_id],
        )
    }

    fn list_loaned_in_category(&self, category_id: CategoryId) -> RepoResult<Vec<PhysicalCopy>> {
        self.query_copies(
            &format!(
                "{COPY_SELECT_SQL}
                 WHERE statusPeminjaman = ?1
                   AND idBuku IN (SELECT idBuku FROM buku WHERE idKategori = ?2)
                 ORDER BY idBukuFisik ASC;"
            ),
            params![loan_status_to_db(LoanStatus::Loaned), category_id],
        )
    }
}

fn parse_copy_row(row: &Row<'_>) -> RepoResult<PhysicalCopy> {
    let condition_text: String = row.get("kondisi")?;
    let condition = parse_condition(&condition_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid condition `{condition_text}` in buku_fisik.kondisi"
        ))
    })?;

    let status_text: String = row.get("statusPeminjaman")?;
    let loan_status = parse_loan_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid loan status `{status_text}` in buku_fisik.statusPeminjaman"
        ))
    })?;

    Ok(PhysicalCopy {
        id: row.get("idBukuFisik")?,
        book_id: row.get("idBuku")?,
        condition,
        loan_status,
        shelf_location: row.get("lokasiRak")?,
    })
}

fn condition_to_db(condition: CopyCondition) -> &'static str {
    match condition {
        CopyCondition::Good => "Baik",
        CopyCondition::Damaged => "Rusak",
    }
}

fn parse_condition(value: &str) -> Option<CopyCondition> {
    match value {
        "Baik" => Some(CopyCondition::Good),
        "Rusak" => Some(CopyCondition::Damaged),
        _ => None,
    }
}

fn loan_status_to_db(status: LoanStatus) -> &'static str {
    match status {
        LoanStatus::Available => "Tersedia",
        LoanStatus::Loaned => "Dipinjam",
        LoanStatus::Lost => "Hilang",
    }
}

fn parse_loan_status(value: &str) -> Option<LoanStatus> {
    match value {
        "Tersedia" => Some(LoanStatus::Available),
        "Dipinjam" => Some(LoanStatus::Loaned),
        "Hilang" => Some(LoanStatus::Lost),
        _ => None,
    }
}
