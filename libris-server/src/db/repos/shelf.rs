//! Bookshelf repository
//!
//! Standalone books with a free-text author, no relation to the catalog.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::DbError;
use crate::models::{PublicationYear, ShelfAuthor, Title};

/// Bookshelf book record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ShelfBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
}

/// List filter. Every field is optional; set fields are ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShelfFilter {
    /// Case-insensitive substring over title or author
    pub q: Option<String>,
    pub publication_year: Option<i32>,
    /// Exact author match
    pub author: Option<String>,
}

/// Bookshelf repository
pub struct ShelfRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShelfRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        title: &Title,
        author: &ShelfAuthor,
        year: PublicationYear,
    ) -> Result<ShelfBook, DbError> {
        let book = sqlx::query_as::<_, ShelfBook>(
            r#"
            INSERT INTO shelf_books (title, author, publication_year)
            VALUES (?, ?, ?)
            RETURNING id, title, author, publication_year
            "#,
        )
        .bind(title.as_str())
        .bind(author.as_str())
        .bind(year.get())
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(shelf_book_id = book.id, "shelf book created");
        Ok(book)
    }

    pub async fn get(&self, id: i64) -> Result<ShelfBook, DbError> {
        sqlx::query_as::<_, ShelfBook>(
            "SELECT id, title, author, publication_year FROM shelf_books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("book", id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM shelf_books WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("book", id));
        }
        Ok(())
    }

    /// Filtered list ordered by title.
    pub async fn list(&self, filter: &ShelfFilter) -> Result<Vec<ShelfBook>, DbError> {
        let mut builder = sqlx::QueryBuilder::new(
            "SELECT id, title, author, publication_year FROM shelf_books WHERE 1=1",
        );

        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_ascii_lowercase();
            builder.push(" AND (instr(lower(title), ");
            builder.push_bind(needle.clone());
            builder.push(") > 0 OR instr(lower(author), ");
            builder.push_bind(needle);
            builder.push(") > 0)");
        }
        if let Some(year) = filter.publication_year {
            builder.push(" AND publication_year = ");
            builder.push_bind(year);
        }
        if let Some(author) = filter.author.as_deref().filter(|a| !a.is_empty()) {
            builder.push(" AND author = ");
            builder.push_bind(author.to_owned());
        }
        builder.push(" ORDER BY title, id");

        let books: Vec<ShelfBook> = builder.build_query_as().fetch_all(self.pool).await?;
        Ok(books)
    }
}
