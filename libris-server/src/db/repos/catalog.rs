//! Catalog repository: authors, books, libraries, librarians
//!
//! Relations:
//! - Book -> Author is a required foreign key; deleting an author deletes
//!   their books
//! - Library <-> Book is many-to-many through `library_books`
//! - Librarian -> Library is one-to-one (UNIQUE library_id); deleting a
//!   library deletes its librarian

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::{is_unique_violation, DbError};
use crate::models::{Name, Title};

/// Author record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// Book record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
}

/// Book joined with its author's name for list display
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct BookWithAuthor {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub author_name: String,
}

/// Library record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Library {
    pub id: i64,
    pub name: String,
}

/// Librarian record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Librarian {
    pub id: i64,
    pub name: String,
    pub library_id: i64,
}

/// Author with the reverse side of the Book foreign key
#[derive(Debug, Clone, Serialize)]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<Book>,
}

/// Library with its books (and their authors) and its librarian
#[derive(Debug, Clone, Serialize)]
pub struct LibraryDetail {
    #[serde(flatten)]
    pub library: Library,
    pub books: Vec<BookWithAuthor>,
    pub librarian: Option<Librarian>,
}

/// Catalog repository
pub struct CatalogRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    // --- authors ---------------------------------------------------------

    pub async fn create_author(&self, name: &Name) -> Result<Author, DbError> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES (?) RETURNING id, name",
        )
        .bind(name.as_str())
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(author_id = author.id, "author created");
        Ok(author)
    }

    pub async fn get_author(&self, id: i64) -> Result<Author, DbError> {
        sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("author", id))
    }

    /// Author plus every book they wrote.
    pub async fn author_with_books(&self, id: i64) -> Result<AuthorWithBooks, DbError> {
        let author = self.get_author(id).await?;
        let books = self.books_by_author(id).await?;
        Ok(AuthorWithBooks { author, books })
    }

    /// Delete an author. Their books (and those books' library memberships)
    /// go with them via ON DELETE CASCADE.
    pub async fn delete_author(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("author", id));
        }

        tracing::info!(author_id = id, "author deleted");
        Ok(())
    }

    /// Reverse lookup of the Book -> Author foreign key.
    pub async fn books_by_author(&self, author_id: i64) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author_id FROM books WHERE author_id = ? ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }

    // --- books -----------------------------------------------------------

    /// Create a book owned by an existing author.
    pub async fn create_book(&self, title: &Title, author_id: i64) -> Result<Book, DbError> {
        let mut tx = self.pool.begin().await?;

        let (author_exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?)")
                .bind(author_id)
                .fetch_one(&mut *tx)
                .await?;

        if !author_exists {
            return Err(DbError::not_found("author", author_id));
        }

        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, author_id) VALUES (?, ?) RETURNING id, title, author_id",
        )
        .bind(title.as_str())
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    pub async fn get_book(&self, id: i64) -> Result<Book, DbError> {
        sqlx::query_as::<_, Book>("SELECT id, title, author_id FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("book", id))
    }

    /// Every book with its author's name, in one joined query.
    pub async fn list_books(&self) -> Result<Vec<BookWithAuthor>, DbError> {
        let books = sqlx::query_as::<_, BookWithAuthor>(
            r#"
            SELECT b.id, b.title, b.author_id, a.name AS author_name
            FROM books b
            JOIN authors a ON a.id = b.author_id
            ORDER BY b.id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }

    /// Reverse side of the many-to-many: libraries holding a book.
    pub async fn libraries_for_book(&self, book_id: i64) -> Result<Vec<Library>, DbError> {
        let libraries = sqlx::query_as::<_, Library>(
            r#"
            SELECT l.id, l.name
            FROM libraries l
            JOIN library_books lb ON lb.library_id = l.id
            WHERE lb.book_id = ?
            ORDER BY l.id
            "#,
        )
        .bind(book_id)
        .fetch_all(self.pool)
        .await?;

        Ok(libraries)
    }

    // --- libraries -------------------------------------------------------

    pub async fn create_library(&self, name: &Name) -> Result<Library, DbError> {
        let library = sqlx::query_as::<_, Library>(
            "INSERT INTO libraries (name) VALUES (?) RETURNING id, name",
        )
        .bind(name.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(library)
    }

    pub async fn get_library(&self, id: i64) -> Result<Library, DbError> {
        sqlx::query_as::<_, Library>("SELECT id, name FROM libraries WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("library", id))
    }

    /// The library with the lowest id, if any exist.
    pub async fn first_library(&self) -> Result<Option<Library>, DbError> {
        let library =
            sqlx::query_as::<_, Library>("SELECT id, name FROM libraries ORDER BY id LIMIT 1")
                .fetch_optional(self.pool)
                .await?;

        Ok(library)
    }

    /// Delete a library. Its librarian and membership rows cascade; the
    /// books themselves stay.
    pub async fn delete_library(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("library", id));
        }

        tracing::info!(library_id = id, "library deleted");
        Ok(())
    }

    /// Add books to a library's collection. Re-adding is a no-op.
    ///
    /// Every id must name an existing book; nothing is added otherwise.
    pub async fn add_books(&self, library_id: i64, book_ids: &[i64]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let (library_exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM libraries WHERE id = ?)")
                .bind(library_id)
                .fetch_one(&mut *tx)
                .await?;

        if !library_exists {
            return Err(DbError::not_found("library", library_id));
        }

        for &book_id in book_ids {
            let (book_exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
                    .bind(book_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if !book_exists {
                return Err(DbError::not_found("book", book_id));
            }

            sqlx::query("INSERT OR IGNORE INTO library_books (library_id, book_id) VALUES (?, ?)")
                .bind(library_id)
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove one book from a library's collection.
    pub async fn remove_book(&self, library_id: i64, book_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM library_books WHERE library_id = ? AND book_id = ?")
            .bind(library_id)
            .bind(book_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "library book",
                format!("{}/{}", library_id, book_id),
            ));
        }

        Ok(())
    }

    /// Books held by a library, with author names, ordered by title.
    pub async fn books_in_library(&self, library_id: i64) -> Result<Vec<BookWithAuthor>, DbError> {
        let books = sqlx::query_as::<_, BookWithAuthor>(
            r#"
            SELECT b.id, b.title, b.author_id, a.name AS author_name
            FROM library_books lb
            JOIN books b ON b.id = lb.book_id
            JOIN authors a ON a.id = b.author_id
            WHERE lb.library_id = ?
            ORDER BY b.title, b.id
            "#,
        )
        .bind(library_id)
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }

    /// Library, its books with authors, and its librarian.
    pub async fn library_detail(&self, id: i64) -> Result<LibraryDetail, DbError> {
        let library = self.get_library(id).await?;
        let books = self.books_in_library(id).await?;
        let librarian = self.librarian_for(id).await?;

        Ok(LibraryDetail {
            library,
            books,
            librarian,
        })
    }

    // --- librarians ------------------------------------------------------

    /// Appoint a librarian. A library holds at most one.
    pub async fn create_librarian(&self, name: &Name, library_id: i64) -> Result<Librarian, DbError> {
        let mut tx = self.pool.begin().await?;

        let (library_exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM libraries WHERE id = ?)")
                .bind(library_id)
                .fetch_one(&mut *tx)
                .await?;

        if !library_exists {
            return Err(DbError::not_found("library", library_id));
        }

        let librarian = sqlx::query_as::<_, Librarian>(
            "INSERT INTO librarians (name, library_id) VALUES (?, ?) RETURNING id, name, library_id",
        )
        .bind(name.as_str())
        .bind(library_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict {
                    resource: "librarian",
                    reason: "library already has a librarian",
                }
            } else {
                DbError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(librarian)
    }

    /// Reverse side of the one-to-one.
    pub async fn librarian_for(&self, library_id: i64) -> Result<Option<Librarian>, DbError> {
        let librarian = sqlx::query_as::<_, Librarian>(
            "SELECT id, name, library_id FROM librarians WHERE library_id = ?",
        )
        .bind(library_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(librarian)
    }

    /// Remove every catalog row. Used before loading sample data.
    pub async fn clear(&self) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for table in ["librarians", "library_books", "libraries", "books", "authors"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_pool;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn title(s: &str) -> Title {
        Title::new(s).unwrap()
    }

    #[tokio::test]
    async fn every_book_is_in_its_authors_collection() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let austen = repo.create_author(&name("Jane Austen")).await.unwrap();
        let orwell = repo.create_author(&name("George Orwell")).await.unwrap();
        repo.create_book(&title("Emma"), austen.id).await.unwrap();
        repo.create_book(&title("Pride and Prejudice"), austen.id).await.unwrap();
        repo.create_book(&title("1984"), orwell.id).await.unwrap();

        for book in repo.list_books().await.unwrap() {
            let owned = repo.books_by_author(book.author_id).await.unwrap();
            assert!(owned.iter().any(|b| b.id == book.id), "{} missing", book.title);
        }

        let austen_books = repo.author_with_books(austen.id).await.unwrap();
        assert_eq!(austen_books.books.len(), 2);
    }

    #[tokio::test]
    async fn book_requires_existing_author() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let err = repo.create_book(&title("Orphan"), 999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "author", .. }));
    }

    #[tokio::test]
    async fn library_holds_exactly_added_books() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let orwell = repo.create_author(&name("George Orwell")).await.unwrap();
        let b1 = repo.create_book(&title("1984"), orwell.id).await.unwrap();
        let b2 = repo.create_book(&title("Animal Farm"), orwell.id).await.unwrap();
        let b3 = repo.create_book(&title("Homage to Catalonia"), orwell.id).await.unwrap();

        let library = repo.create_library(&name("West End Branch")).await.unwrap();
        assert!(repo.books_in_library(library.id).await.unwrap().is_empty());

        repo.add_books(library.id, &[b1.id, b2.id]).await.unwrap();
        repo.add_books(library.id, &[b1.id]).await.unwrap();

        let ids: Vec<i64> = repo
            .books_in_library(library.id)
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![b1.id, b2.id]);
        assert!(!ids.contains(&b3.id));

        let holders = repo.libraries_for_book(b1.id).await.unwrap();
        assert_eq!(holders, vec![library.clone()]);

        repo.remove_book(library.id, b1.id).await.unwrap();
        assert_eq!(repo.books_in_library(library.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_books_is_all_or_nothing() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let author = repo.create_author(&name("A")).await.unwrap();
        let book = repo.create_book(&title("B"), author.id).await.unwrap();
        let library = repo.create_library(&name("L")).await.unwrap();

        let err = repo.add_books(library.id, &[book.id, 404]).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "book", .. }));
        assert!(repo.books_in_library(library.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_library_removes_librarian_but_not_books() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let author = repo.create_author(&name("George Orwell")).await.unwrap();
        let book = repo.create_book(&title("1984"), author.id).await.unwrap();
        let library = repo.create_library(&name("Central City Library")).await.unwrap();
        repo.add_books(library.id, &[book.id]).await.unwrap();
        let librarian = repo
            .create_librarian(&name("Alice Smith"), library.id)
            .await
            .unwrap();
        assert_eq!(
            repo.librarian_for(library.id).await.unwrap(),
            Some(librarian.clone())
        );

        repo.delete_library(library.id).await.unwrap();

        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM librarians WHERE id = ?")
                .bind(librarian.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
        assert!(repo.get_book(book.id).await.is_ok());
        assert!(repo.libraries_for_book(book.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_author_removes_their_books() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let austen = repo.create_author(&name("Jane Austen")).await.unwrap();
        let orwell = repo.create_author(&name("George Orwell")).await.unwrap();
        let emma = repo.create_book(&title("Emma"), austen.id).await.unwrap();
        let farm = repo.create_book(&title("Animal Farm"), orwell.id).await.unwrap();

        repo.delete_author(austen.id).await.unwrap();

        assert!(matches!(
            repo.get_book(emma.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(repo.get_book(farm.id).await.is_ok());
        assert!(matches!(
            repo.delete_author(austen.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn one_librarian_per_library() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let library = repo.create_library(&name("Central")).await.unwrap();
        repo.create_librarian(&name("Alice"), library.id).await.unwrap();

        let err = repo
            .create_librarian(&name("Bob"), library.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { resource: "librarian", .. }));

        let err = repo.create_librarian(&name("Carol"), 42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "library", .. }));
    }

    #[tokio::test]
    async fn library_detail_and_first_library() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        assert!(repo.first_library().await.unwrap().is_none());

        let author = repo.create_author(&name("Jane Austen")).await.unwrap();
        let emma = repo.create_book(&title("Emma"), author.id).await.unwrap();
        let first = repo.create_library(&name("First")).await.unwrap();
        repo.create_library(&name("Second")).await.unwrap();
        repo.add_books(first.id, &[emma.id]).await.unwrap();

        assert_eq!(repo.first_library().await.unwrap(), Some(first.clone()));

        let detail = repo.library_detail(first.id).await.unwrap();
        assert_eq!(detail.books[0].author_name, "Jane Austen");
        assert!(detail.librarian.is_none());
    }

    #[tokio::test]
    async fn clear_empties_catalog() {
        let pool = memory_pool().await;
        let repo = CatalogRepo::new(&pool);

        let author = repo.create_author(&name("A")).await.unwrap();
        repo.create_book(&title("B"), author.id).await.unwrap();
        repo.clear().await.unwrap();

        assert!(repo.list_books().await.unwrap().is_empty());
        assert!(repo.first_library().await.unwrap().is_none());
    }
}
