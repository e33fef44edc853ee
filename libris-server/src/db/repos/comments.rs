//! Comment repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{DbError, Owned};
use crate::models::Content;

/// Comment with its author's username
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_COMMENT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, u.username AS author,
           c.content, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// Comment repository
pub struct CommentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment to an existing post.
    pub async fn create(
        &self,
        author_id: i64,
        post_id: i64,
        content: &Content,
    ) -> Result<Comment, DbError> {
        let mut tx = self.pool.begin().await?;

        let (post_exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;

        if !post_exists {
            return Err(DbError::not_found("post", post_id));
        }

        let now = Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO comments (post_id, author_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let comment = fetch(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(comment_id = id, post_id, "comment created");
        Ok(comment)
    }

    pub async fn get(&self, id: i64) -> Result<Comment, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Comments on a post, oldest first.
    pub async fn for_post(&self, post_id: i64) -> Result<Vec<Comment>, DbError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{SELECT_COMMENT} WHERE c.post_id = ? ORDER BY c.created_at, c.id"
        ))
        .bind(post_id)
        .fetch_all(self.pool)
        .await?;

        Ok(comments)
    }

    /// Replace a comment's text. Only its author may.
    pub async fn update(
        &self,
        actor_id: i64,
        id: i64,
        content: &Content,
    ) -> Result<Owned<Comment>, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = fetch(&mut tx, id).await?;
        if current.author_id != actor_id {
            return Ok(Owned::NotOwner);
        }

        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = fetch(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(comment_id = id, "comment updated");
        Ok(Owned::Done(updated))
    }

    /// Delete a comment. Only its author may. Returns the removed comment.
    pub async fn delete(&self, actor_id: i64, id: i64) -> Result<Owned<Comment>, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = fetch(&mut tx, id).await?;
        if current.author_id != actor_id {
            return Ok(Owned::NotOwner);
        }

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(comment_id = id, "comment deleted");
        Ok(Owned::Done(current))
    }
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Comment, DbError> {
    sqlx::query_as::<_, Comment>(&format!("{SELECT_COMMENT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("comment", id))
}
