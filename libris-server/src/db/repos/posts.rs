//! Blog post repository
//!
//! Handles:
//! - Newest-first paginated listing with tag and text filters
//! - Post creation and update with tags written in the same transaction
//! - Author-only update and delete

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::comments::{Comment, CommentRepo};
use super::tags::{get_or_create_in, Tag};
use super::{DbError, Owned};
use crate::models::{Content, Paginated, Pagination, TagList, Title};

/// Post with author name and tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author: String,
    pub published_date: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

/// Post with its comments, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Validated post form
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: Title,
    pub content: Content,
    pub tags: TagList,
}

/// List filter. Both fields optional; set fields are ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    /// Keep posts carrying the tag with exactly this slug
    pub tag_slug: Option<String>,
    /// Case-insensitive match on title, content, or any tag name. Used as
    /// given, surrounding whitespace included; empty means no filter.
    pub query: Option<String>,
}

/// Post repository
pub struct PostRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of posts, newest first.
    ///
    /// A post matching the query on several fields or tags still appears
    /// once: tag conditions are EXISTS subqueries, never joins.
    pub async fn list_posts(
        &self,
        filter: &PostFilter,
        page: Pagination,
    ) -> Result<Paginated<Post>, DbError> {
        let mut builder = sqlx::QueryBuilder::new(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.username AS author,
                   p.published_date, COUNT(*) OVER() AS total
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE 1=1
            "#,
        );

        if let Some(slug) = filter.tag_slug.as_deref() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.post_id = p.id AND t.slug = ",
            );
            builder.push_bind(slug.to_owned());
            builder.push(")");
        }

        // Folding matches SQLite's lower(): ASCII only.
        if let Some(q) = filter.query.as_deref().filter(|q| !q.is_empty()) {
            let needle = q.to_ascii_lowercase();
            builder.push(" AND (instr(lower(p.title), ");
            builder.push_bind(needle.clone());
            builder.push(") > 0 OR instr(lower(p.content), ");
            builder.push_bind(needle.clone());
            builder.push(
                ") > 0 OR EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.post_id = p.id AND instr(lower(t.name), ",
            );
            builder.push_bind(needle);
            builder.push(") > 0))");
        }

        builder.push(" ORDER BY p.published_date DESC, p.id DESC LIMIT ");
        builder.push_bind(page.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(page.offset() as i64);

        let rows = builder.build().fetch_all(self.pool).await?;

        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let mut items: Vec<Post> = rows
            .into_iter()
            .map(|r| Post {
                id: r.get("id"),
                title: r.get("title"),
                content: r.get("content"),
                author_id: r.get("author_id"),
                author: r.get("author"),
                published_date: r.get("published_date"),
                tags: Vec::new(),
            })
            .collect();

        self.attach_tags(&mut items).await?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// Load tags for a page of posts in one query.
    async fn attach_tags(&self, posts: &mut [Post]) -> Result<(), DbError> {
        if posts.is_empty() {
            return Ok(());
        }

        let mut builder = sqlx::QueryBuilder::new(
            "SELECT pt.post_id, t.id, t.name, t.slug FROM post_tags pt \
             JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id IN (",
        );
        let mut ids = builder.separated(", ");
        for post in posts.iter() {
            ids.push_bind(post.id);
        }
        builder.push(") ORDER BY t.name");

        let rows = builder.build().fetch_all(self.pool).await?;

        let mut by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
        for r in rows {
            by_post.entry(r.get("post_id")).or_default().push(Tag {
                id: r.get("id"),
                name: r.get("name"),
                slug: r.get("slug"),
            });
        }

        for post in posts.iter_mut() {
            post.tags = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Single post with author and tags.
    pub async fn get(&self, id: i64) -> Result<Post, DbError> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.username AS author, p.published_date
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("post", id))?;

        let mut posts = [Post {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            author_id: row.get("author_id"),
            author: row.get("author"),
            published_date: row.get("published_date"),
            tags: Vec::new(),
        }];
        self.attach_tags(&mut posts).await?;

        let [post] = posts;
        Ok(post)
    }

    /// Post with tags and comments.
    pub async fn get_post(&self, id: i64) -> Result<PostDetail, DbError> {
        let post = self.get(id).await?;
        let comments = CommentRepo::new(self.pool).for_post(id).await?;
        Ok(PostDetail { post, comments })
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        form: &NewPost,
        published_date: DateTime<Utc>,
    ) -> Result<Post, DbError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO posts (title, content, author_id, published_date)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(form.title.as_str())
        .bind(form.content.as_str())
        .bind(author_id)
        .bind(published_date)
        .fetch_one(&mut *tx)
        .await?;

        write_tags(&mut tx, id, &form.tags).await?;
        tx.commit().await?;

        tracing::info!(post_id = id, author_id, "post created");
        self.get(id).await
    }

    /// Replace title, content, and tags. Only the author may do this.
    pub async fn update_post(
        &self,
        actor_id: i64,
        id: i64,
        form: &NewPost,
    ) -> Result<Owned<Post>, DbError> {
        let mut tx = self.pool.begin().await?;

        if post_author(&mut tx, id).await? != actor_id {
            return Ok(Owned::NotOwner);
        }

        sqlx::query("UPDATE posts SET title = ?, content = ? WHERE id = ?")
            .bind(form.title.as_str())
            .bind(form.content.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        write_tags(&mut tx, id, &form.tags).await?;

        tx.commit().await?;

        tracing::info!(post_id = id, "post updated");
        Ok(Owned::Done(self.get(id).await?))
    }

    /// Delete a post and, by cascade, its comments. Only the author may.
    pub async fn delete_post(&self, actor_id: i64, id: i64) -> Result<Owned<()>, DbError> {
        let mut tx = self.pool.begin().await?;

        if post_author(&mut tx, id).await? != actor_id {
            return Ok(Owned::NotOwner);
        }

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(post_id = id, "post deleted");
        Ok(Owned::Done(()))
    }
}

async fn post_author(conn: &mut SqliteConnection, id: i64) -> Result<i64, DbError> {
    sqlx::query_scalar::<_, i64>("SELECT author_id FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("post", id))
}

async fn write_tags(conn: &mut SqliteConnection, post_id: i64, tags: &TagList) -> Result<(), DbError> {
    for (name, slug) in tags.with_slugs() {
        let tag = get_or_create_in(&mut *conn, name, &slug).await?;
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::POSTS_PER_PAGE;
    use crate::testing::{create_user, memory_pool};
    use chrono::{Duration, TimeZone};

    fn form(title: &str, content: &str, tags: &str) -> NewPost {
        NewPost {
            title: Title::new(title).unwrap(),
            content: Content::new(content).unwrap(),
            tags: TagList::parse(tags).unwrap(),
        }
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(n)
    }

    fn search(q: &str) -> PostFilter {
        PostFilter {
            query: Some(q.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn second_page_holds_items_six_to_ten() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);

        for i in 1..=12 {
            repo.create_post(author.id, &form(&format!("Post {i}"), "body", ""), day(i))
                .await
                .unwrap();
        }

        let page2 = repo
            .list_posts(&PostFilter::default(), Pagination::new(2, POSTS_PER_PAGE))
            .await
            .unwrap();
        let titles: Vec<&str> = page2.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 7", "Post 6", "Post 5", "Post 4", "Post 3"]);
        assert_eq!(page2.total, 12);
        assert_eq!(page2.total_pages(), 3);
        assert!(page2.has_next() && page2.has_prev());

        let page4 = repo
            .list_posts(&PostFilter::default(), Pagination::new(4, POSTS_PER_PAGE))
            .await
            .unwrap();
        assert!(!page4.page_exists());
    }

    #[tokio::test]
    async fn search_covers_title_content_and_tags_without_duplicates() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);

        let both = repo
            .create_post(
                author.id,
                &form("Rust tips", "Learning RUST daily", "rust, rustacean"),
                day(1),
            )
            .await
            .unwrap();
        let tagged = repo
            .create_post(author.id, &form("Weekend", "Nothing here", "Rust"), day(2))
            .await
            .unwrap();
        repo.create_post(author.id, &form("Gardening", "Tomatoes", "plants"), day(3))
            .await
            .unwrap();

        let found = repo
            .list_posts(&search("rUsT"), Pagination::default())
            .await
            .unwrap();
        let ids: Vec<i64> = found.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![tagged.id, both.id]);
        assert_eq!(found.total, 2);

        let content_only = repo
            .list_posts(&search("tomato"), Pagination::default())
            .await
            .unwrap();
        assert_eq!(content_only.items.len(), 1);
        assert_eq!(content_only.items[0].title, "Gardening");
    }

    #[tokio::test]
    async fn search_exact_title() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);

        repo.create_post(author.id, &form("1984", "Orwell", ""), day(1))
            .await
            .unwrap();
        repo.create_post(author.id, &form("Animal Farm", "Orwell", ""), day(2))
            .await
            .unwrap();

        let found = repo
            .list_posts(&search("1984"), Pagination::default())
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].title, "1984");
    }

    #[tokio::test]
    async fn search_matches_accented_text() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);

        repo.create_post(author.id, &form("Élan Vital", "Bergson", "Philosophie"), day(1))
            .await
            .unwrap();

        for q in ["Élan", "Élan Vital", "ÉLAN", "VITAL"] {
            let found = repo
                .list_posts(&search(q), Pagination::default())
                .await
                .unwrap();
            assert_eq!(found.total, 1, "query {q:?}");
        }
    }

    #[tokio::test]
    async fn whitespace_query_is_searched_as_given() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);

        repo.create_post(author.id, &form("Two words", "x", ""), day(1))
            .await
            .unwrap();
        repo.create_post(author.id, &form("Single", "y", ""), day(2))
            .await
            .unwrap();

        let found = repo
            .list_posts(&search(" "), Pagination::default())
            .await
            .unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].title, "Two words");

        let all = repo
            .list_posts(&search(""), Pagination::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn tag_slug_filter() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);

        let web = repo
            .create_post(author.id, &form("A", "x", "Web Dev, rust"), day(1))
            .await
            .unwrap();
        repo.create_post(author.id, &form("B", "y", "rust"), day(2))
            .await
            .unwrap();

        let filter = PostFilter {
            tag_slug: Some("web-dev".into()),
            ..Default::default()
        };
        let found = repo.list_posts(&filter, Pagination::default()).await.unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].id, web.id);

        let names: Vec<&str> = web.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Web Dev", "rust"]);
    }

    #[tokio::test]
    async fn only_author_updates_or_deletes() {
        let pool = memory_pool().await;
        let owner = create_user(&pool, "owner").await;
        let other = create_user(&pool, "other").await;
        let repo = PostRepo::new(&pool);

        let post = repo
            .create_post(owner.id, &form("Draft", "first", "old"), day(1))
            .await
            .unwrap();

        let edit = form("Final", "second", "new");
        assert_eq!(
            repo.update_post(other.id, post.id, &edit).await.unwrap(),
            Owned::NotOwner
        );
        assert_eq!(repo.delete_post(other.id, post.id).await.unwrap(), Owned::NotOwner);

        let Owned::Done(updated) = repo.update_post(owner.id, post.id, &edit).await.unwrap() else {
            panic!("owner update refused");
        };
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].name, "new");

        assert_eq!(repo.delete_post(owner.id, post.id).await.unwrap(), Owned::Done(()));
        assert!(matches!(
            repo.get(post.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            repo.delete_post(owner.id, post.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn deleting_post_removes_comments() {
        let pool = memory_pool().await;
        let author = create_user(&pool, "writer").await;
        let repo = PostRepo::new(&pool);
        let comments = CommentRepo::new(&pool);

        let post = repo
            .create_post(author.id, &form("Hello", "world", ""), day(1))
            .await
            .unwrap();
        let comment = comments
            .create(author.id, post.id, &Content::new("nice").unwrap())
            .await
            .unwrap();

        let detail = repo.get_post(post.id).await.unwrap();
        assert_eq!(detail.comments, vec![comment.clone()]);

        repo.delete_post(author.id, post.id).await.unwrap();
        assert!(comments.get(comment.id).await.is_err());
    }
}
