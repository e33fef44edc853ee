//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Leans on declared constraints (UNIQUE, ON DELETE CASCADE) instead of
//!   check-then-act in application code
//! - Uses transactions for multi-step operations

pub mod catalog;
pub mod shelf;
pub mod users;
pub mod tags;
pub mod posts;
pub mod comments;

pub use catalog::{
    Author, AuthorWithBooks, Book, BookWithAuthor, CatalogRepo, Librarian, Library, LibraryDetail,
};
pub use shelf::{ShelfBook, ShelfFilter, ShelfRepo};
pub use users::{AuthToken, User, UserRepo};
pub use tags::{Tag, TagRepo};
pub use posts::{NewPost, Post, PostDetail, PostFilter, PostRepo};
pub use comments::{Comment, CommentRepo};

use crate::auth::AuthError;
use crate::models::ValidationError;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource}: {reason}")]
    Conflict {
        resource: &'static str,
        reason: &'static str,
    },

    /// Input that only the database can reject (e.g. a taken username)
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// True when the statement failed on a UNIQUE or PRIMARY KEY constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Outcome of an owner-gated mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owned<T> {
    /// The actor owns the record and the change was applied
    Done(T),
    /// The record exists but belongs to someone else
    NotOwner,
}
