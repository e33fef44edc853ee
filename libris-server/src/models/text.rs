//! Bounded text fields shared by the catalog, bookshelf, and blog

use super::validation::bounded;
use super::ValidationError;

/// Maximum length for names (authors, libraries, librarians)
const MAX_NAME_LEN: usize = 100;

/// Maximum length for book and post titles
const MAX_TITLE_LEN: usize = 200;

/// Maximum length for the free-text author on bookshelf entries
const MAX_SHELF_AUTHOR_LEN: usize = 100;

/// Validated name of an author, library, or librarian
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(String);

impl Name {
    /// Create a new name.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 100 characters
    ///
    /// # Example
    /// ```
    /// use libris_server::models::Name;
    ///
    /// assert!(Name::new("Jane Austen").is_ok());
    /// assert!(Name::new("  ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded("name", s, MAX_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated book or post title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    /// Create a new title: non-empty after trimming, max 200 characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded("title", s, MAX_TITLE_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-text author of a bookshelf entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfAuthor(String);

impl ShelfAuthor {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded("author", s, MAX_SHELF_AUTHOR_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body of a post or comment. Unbounded, but never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content(String);

impl Content {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Content {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert_eq!(Name::new("  Emma ").unwrap().as_str(), "Emma");
        assert!(matches!(
            Name::new("").unwrap_err(),
            ValidationError::Empty { field: "name" }
        ));
        assert!(Name::new(&"a".repeat(100)).is_ok());
        assert!(matches!(
            Name::new(&"a".repeat(101)).unwrap_err(),
            ValidationError::TooLong { max: 100, .. }
        ));
    }

    #[test]
    fn title_max_length() {
        assert!(Title::new(&"t".repeat(200)).is_ok());
        let err = Title::new(&"t".repeat(201)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "title", max: 200 }));
    }

    #[test]
    fn content_rejects_whitespace_only() {
        assert!(matches!(
            Content::new(" \n\t ").unwrap_err(),
            ValidationError::Empty { field: "content" }
        ));
        let long = "x".repeat(100_000);
        assert_eq!(Content::new(&long).unwrap().as_str().len(), 100_000);
    }

    #[test]
    fn shelf_author_field_name() {
        assert_eq!(ShelfAuthor::new("").unwrap_err().field(), "author");
    }
}
