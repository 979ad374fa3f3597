//! Book record and its category projection.

use super::category::{Category, CategoryId};
use super::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned book id (`buku.idBuku`).
pub type BookId = i64;

/// Persisted book row.
///
/// `category_id` is cleared to `None` when the owning category is removed
/// without cascading, leaving the book uncategorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub description: String,
    /// Publication date as entered by the cataloguer.
    pub publication_date: String,
    pub category_id: Option<CategoryId>,
    pub is_deleted: bool,
}

impl Book {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.title) {
            return Err(ValidationError::BlankBookTitle);
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Insert draft for a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub publication_date: String,
    pub category_id: Option<CategoryId>,
}

impl NewBook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn published(mut self, publication_date: impl Into<String>) -> Self {
        self.publication_date = publication_date.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.title) {
            return Err(ValidationError::BlankBookTitle);
        }
        Ok(())
    }
}

/// Book joined with its category, if any.
///
/// The category is resolved regardless of its soft-delete flag so a book
/// still pointing at a tombstoned category shows where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookWithCategory {
    pub book: Book,
    pub category: Option<Category>,
}
