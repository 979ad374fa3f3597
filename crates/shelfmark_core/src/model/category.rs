//! Category hierarchy node.
//!
//! # Invariants
//! - `name` is never blank.
//! - Following `parent_id` links never reaches the same category again.

use super::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned category id (`kategori.idKategori`).
pub type CategoryId = i64;

/// Persisted category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// `None` means a top-level category.
    pub parent_id: Option<CategoryId>,
    pub is_deleted: bool,
}

impl Category {
    /// Checks the fields a caller can get wrong.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::BlankCategoryName);
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Insert draft for a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::BlankCategoryName);
        }
        Ok(())
    }
}
