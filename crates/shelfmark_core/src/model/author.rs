//! Author record and book/author links.

use super::book::BookId;
use serde::{Deserialize, Serialize};

/// Store-assigned author id (`penulis.idPenulis`).
pub type AuthorId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub biography: String,
    pub is_deleted: bool,
}

/// Insert draft for an author. Not validated; see `CatalogService::insert_author`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub biography: String,
}

impl NewAuthor {
    pub fn new(name: impl Into<String>, biography: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            biography: biography.into(),
        }
    }
}

/// Many-to-many link row, keyed by both ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookAuthorLink {
    pub book_id: BookId,
    pub author_id: AuthorId,
}
