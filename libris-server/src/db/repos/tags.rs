//! Tag repository
//!
//! Tags are created on demand from post forms. Names are unique; slugs are
//! unique too, so two names that slugify alike get numbered slugs.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use libris_core::{slug_base, unique_slug};

use super::{is_unique_violation, DbError};

/// Attempts before giving up on a slug that keeps being claimed concurrently
const MAX_SLUG_ATTEMPTS: usize = 3;

/// Tag record from database
#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Tag repository
pub struct TagRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TagRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Every tag, alphabetically.
    pub async fn list(&self) -> Result<Vec<Tag>, DbError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(tags)
    }
}

/// Look a tag up by exact name, creating it with the first free slug when
/// absent. Runs on the caller's connection so post writes stay atomic.
///
/// A name inserted concurrently is read back; a slug claimed concurrently
/// is recomputed.
pub(crate) async fn get_or_create_in(
    conn: &mut SqliteConnection,
    name: &str,
    base_slug: &str,
) -> Result<Tag, DbError> {
    let base = slug_base(base_slug);

    for _ in 0..MAX_SLUG_ATTEMPTS {
        let existing = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(tag) = existing {
            return Ok(tag);
        }

        let taken: HashSet<String> = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM tags WHERE slug = ? OR slug LIKE ? || '-%'",
        )
        .bind(base)
        .bind(base)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();

        let slug = unique_slug(base, |candidate| taken.contains(candidate));

        let inserted = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, slug) VALUES (?, ?)
            ON CONFLICT(name) DO NOTHING
            RETURNING id, name, slug
            "#,
        )
        .bind(name)
        .bind(&slug)
        .fetch_optional(&mut *conn)
        .await;

        match inserted {
            Ok(Some(tag)) => {
                tracing::debug!(tag = %tag.name, slug = %tag.slug, "tag created");
                return Ok(tag);
            }
            // Name appeared since the lookup; the next pass reads it.
            Ok(None) => continue,
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(tag = name, slug = %slug, "slug taken concurrently, retrying");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(DbError::Conflict {
        resource: "tag",
        reason: "slug kept changing while creating the tag",
    })
}
