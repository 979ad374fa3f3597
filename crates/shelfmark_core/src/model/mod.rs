//! Catalog entity schema.
//!
//! # Responsibility
//! - Define the row shapes for categories, authors, books, physical copies,
//!   book/author links and audit entries.
//! - Define insert drafts and input validation shared by service callers.
//!
//! # Invariants
//! - Ids are store-assigned integers; drafts never carry one.
//! - Deletion of categories, authors and books is a soft-delete flag.

pub mod audit;
pub mod author;
pub mod book;
pub mod category;
pub mod copy;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-correctable input problems detected before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Category `name` is empty after trim.
    BlankCategoryName,
    /// Book `title` is empty after trim.
    BlankBookTitle,
    /// Physical copy `shelf_location` is empty after trim.
    BlankShelfLocation,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankCategoryName => write!(f, "category name must not be blank"),
            Self::BlankBookTitle => write!(f, "book title must not be blank"),
            Self::BlankShelfLocation => write!(f, "shelf location must not be blank"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
