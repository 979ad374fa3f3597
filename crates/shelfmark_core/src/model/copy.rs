//! Physical copy of a book held on a shelf.
//!
//! # Invariants
//! - Every copy belongs to exactly one book.
//! - Copies are hard-deleted only through the owning book's cascade.

use super::book::BookId;
use super::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned copy id (`buku_fisik.idBukuFisik`).
pub type CopyId = i64;

/// Physical state of a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyCondition {
    Good,
    Damaged,
}

/// Borrowing state of a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// On the shelf and can be borrowed.
    Available,
    /// Currently out with a borrower. Blocks category deletion.
    Loaned,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalCopy {
    pub id: CopyId,
    pub book_id: BookId,
    pub condition: CopyCondition,
    pub loan_status: LoanStatus,
    pub shelf_location: String,
}

impl PhysicalCopy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.shelf_location) {
            return Err(ValidationError::BlankShelfLocation);
        }
        Ok(())
    }

    pub fn is_on_loan(&self) -> bool {
        self.loan_status == LoanStatus::Loaned
    }
}

/// Insert draft for a physical copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhysicalCopy {
    pub book_id: BookId,
    pub condition: CopyCondition,
    pub loan_status: LoanStatus,
    pub shelf_location: String,
}

impl NewPhysicalCopy {
    /// Draft for a copy in good condition, available on `shelf_location`.
    pub fn available(book_id: BookId, shelf_location: impl Into<String>) -> Self {
        Self {
            book_id,
            condition: CopyCondition::Good,
            loan_status: LoanStatus::Available,
            shelf_location: shelf_location.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.shelf_location) {
            return Err(ValidationError::BlankShelfLocation);
        }
        Ok(())
    }
}
