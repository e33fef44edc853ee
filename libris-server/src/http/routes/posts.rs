//! Blog post endpoints under `/blog`
//!
//! Lists are newest first, five per page. Every listing route accepts
//! `?page=` (a number or `last`) and `?q=`; the tag route additionally
//! filters by slug.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::comments::add_comment;
use crate::db::repos::{NewPost, Owned, Post, PostDetail, PostFilter, PostRepo, Tag, TagRepo};
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;
use crate::models::{
    Content, FormErrors, PageRequest, Paginated, Pagination, TagList, Title, POSTS_PER_PAGE,
};

/// Query string of the listing routes
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Kept raw so a bad value becomes a 404 rather than a rejection
    pub page: Option<String>,
    pub q: Option<String>,
}

/// Tags arrive either as one string (`"rust, web dev"`) or a JSON array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    Text(String),
    List(Vec<String>),
}

impl Default for TagsInput {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: TagsInput,
}

impl PostRequest {
    fn validate(&self) -> Result<NewPost, FormErrors> {
        let title = Title::new(&self.title);
        let content = Content::new(&self.content);
        let tags = match &self.tags {
            TagsInput::Text(s) => TagList::parse(s),
            TagsInput::List(names) => TagList::from_names(names),
        };

        match (title, content, tags) {
            (Ok(title), Ok(content), Ok(tags)) => Ok(NewPost {
                title,
                content,
                tags,
            }),
            (t, c, g) => Err(FormErrors::collect([t.err(), c.err(), g.err()])),
        }
    }
}

/// Current values of a post, for pre-filling an edit form
#[derive(Debug, Serialize)]
pub struct PostFormValues {
    pub title: String,
    pub content: String,
    pub tags: String,
}

impl From<Post> for PostFormValues {
    fn from(post: Post) -> Self {
        let tags = post
            .tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            title: post.title,
            content: post.content,
            tags,
        }
    }
}

async fn list_with(
    state: &AppState,
    filter: PostFilter,
    page: Option<String>,
) -> Result<Json<Paginated<Post>>, ApiError> {
    let raw = page.as_deref();
    let request =
        PageRequest::parse(raw).ok_or_else(|| ApiError::invalid_page(raw.unwrap_or_default()))?;
    let repo = PostRepo::new(&state.pool);

    let result = match request {
        PageRequest::Number(n) => {
            repo.list_posts(&filter, Pagination::new(n, POSTS_PER_PAGE))
                .await?
        }
        PageRequest::Last => {
            let first = repo
                .list_posts(&filter, Pagination::new(1, POSTS_PER_PAGE))
                .await?;
            match first.total_pages() {
                1 => first,
                last => {
                    repo.list_posts(&filter, Pagination::new(last, POSTS_PER_PAGE))
                        .await?
                }
            }
        }
    };

    if !result.page_exists() {
        return Err(ApiError::invalid_page(result.page));
    }
    Ok(Json(result))
}

/// GET /blog/, /blog/posts, /blog/search - newest first, optional `q`
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Post>>, ApiError> {
    let filter = PostFilter {
        tag_slug: None,
        query: params.q,
    };
    list_with(&state, filter, params.page).await
}

/// GET /blog/tags/{tag_slug}
async fn posts_by_tag(
    State(state): State<Arc<AppState>>,
    Path(tag_slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Post>>, ApiError> {
    let filter = PostFilter {
        tag_slug: Some(tag_slug),
        query: params.q,
    };
    list_with(&state, filter, params.page).await
}

/// GET /blog/tags - every tag, alphabetically
async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(TagRepo::new(&state.pool).list().await?))
}

/// GET /blog/post/{id} - post with tags and comments
async fn post_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError> {
    let detail = PostRepo::new(&state.pool).get_post(id).await?;
    Ok(Json(detail))
}

/// POST /blog/post/new
async fn create_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<PostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let form = req.validate()?;
    let post = PostRepo::new(&state.pool)
        .create_post(auth.user.id, &form, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Fetch a post and make sure the caller wrote it.
async fn owned_post(state: &AppState, auth: &AuthUser, id: i64) -> Result<Post, ApiError> {
    let post = PostRepo::new(&state.pool).get(id).await?;
    if post.author_id != auth.user.id {
        return Err(ApiError::forbidden("only the author may change this post"));
    }
    Ok(post)
}

/// GET /blog/post/{id}/update - current values
async fn edit_post_form(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PostFormValues>, ApiError> {
    let post = owned_post(&state, &auth, id).await?;
    Ok(Json(PostFormValues::from(post)))
}

/// POST /blog/post/{id}/update
async fn update_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<PostRequest>,
) -> Result<Json<Post>, ApiError> {
    let form = req.validate()?;
    match PostRepo::new(&state.pool)
        .update_post(auth.user.id, id, &form)
        .await?
    {
        Owned::Done(post) => Ok(Json(post)),
        Owned::NotOwner => Err(ApiError::forbidden("only the author may change this post")),
    }
}

/// GET /blog/post/{id}/delete - confirmation view
async fn confirm_delete_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(owned_post(&state, &auth, id).await?))
}

/// POST /blog/post/{id}/delete
async fn delete_post(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    match PostRepo::new(&state.pool).delete_post(auth.user.id, id).await? {
        Owned::Done(()) => Ok(StatusCode::NO_CONTENT),
        Owned::NotOwner => Err(ApiError::forbidden("only the author may delete this post")),
    }
}

/// Blog post routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/blog", get(list_posts))
        .route("/blog/", get(list_posts))
        .route("/blog/posts", get(list_posts))
        .route("/blog/search", get(list_posts))
        .route("/blog/tags", get(list_tags))
        .route("/blog/tags/{tag_slug}", get(posts_by_tag))
        .route("/blog/post/new", axum::routing::post(create_post))
        .route("/blog/post/{id}", get(post_detail).post(add_comment))
        .route(
            "/blog/post/{id}/update",
            get(edit_post_form).post(update_post),
        )
        .route(
            "/blog/post/{id}/delete",
            get(confirm_delete_post).post(delete_post),
        )
}

#[cfg(test)]
mod tests {
    use crate::testing::{get, login, post, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn twelve_posts_paginate_by_five() {
        let (app, pool) = test_app().await;
        let (_user, token) = login(&pool, "writer").await;

        for i in 1..=12 {
            let (status, _) = send(
                &app,
                post(
                    "/blog/post/new",
                    Some(&token),
                    json!({"title": format!("Post {i}"), "content": "body"}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, page) = send(&app, get("/blog/posts?page=2", None)).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = page["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Post 7", "Post 6", "Post 5", "Post 4", "Post 3"]);
        assert_eq!(page["total_pages"], 3);

        let (status, _) = send(&app, get("/blog/?page=4", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, last) = send(&app, get("/blog/posts?page=last", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(last["page"], 3);
        assert_eq!(last["items"][1]["title"], "Post 1");

        for bad in ["abc", "-1", "0"] {
            let (status, body) = send(&app, get(&format!("/blog/posts?page={bad}"), None)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "page={bad}");
            assert_eq!(body["error"], "not_found");
        }

        let (status, empty) = send(&app, get("/blog/search?q=nothing-matches", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(empty["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn search_and_tag_routes() {
        let (app, pool) = test_app().await;
        let (_user, token) = login(&pool, "writer").await;

        let create = |title: &str, content: &str, tags: serde_json::Value| {
            post(
                "/blog/post/new",
                Some(&token),
                json!({"title": title, "content": content, "tags": tags}),
            )
        };
        send(&app, create("Rust tips", "learning rust", json!("rust, tips"))).await;
        send(&app, create("Weekend", "Tomatoes", json!(["Gardening", "Web Dev"]))).await;

        let (_, found) = send(&app, get("/blog/search?q=RUST", None)).await;
        assert_eq!(found["total"], 1);
        assert_eq!(found["items"][0]["title"], "Rust tips");

        let (_, tagged) = send(&app, get("/blog/tags/web-dev", None)).await;
        assert_eq!(tagged["total"], 1);
        assert_eq!(tagged["items"][0]["title"], "Weekend");

        let (_, gardening) = send(&app, get("/blog/search?q=garden", None)).await;
        assert_eq!(gardening["items"][0]["title"], "Weekend");
    }

    #[tokio::test]
    async fn punctuation_only_tags_get_distinct_slugs() {
        let (app, pool) = test_app().await;
        let (_user, token) = login(&pool, "writer").await;

        let (status, created) = send(
            &app,
            post(
                "/blog/post/new",
                Some(&token),
                json!({"title": "Shouting", "content": "loud", "tags": "!!!, ???"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let slugs: Vec<&str> = created["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["tag", "tag-1"]);

        let (status, tags) = send(&app, get("/blog/tags", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tags.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn post_ownership_rules() {
        let (app, pool) = test_app().await;
        let (_owner, owner_token) = login(&pool, "owner").await;
        let (_other, other_token) = login(&pool, "other").await;

        let (_, created) = send(
            &app,
            post(
                "/blog/post/new",
                Some(&owner_token),
                json!({"title": "Mine", "content": "hands off", "tags": "a, b"}),
            ),
        )
        .await;
        let id = created["id"].as_i64().unwrap();
        let update = format!("/blog/post/{id}/update");
        let delete = format!("/blog/post/{id}/delete");
        let edit = json!({"title": "Edited", "content": "changed"});

        let (status, _) = send(&app, post(&update, None, edit.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, post(&update, Some(&other_token), edit.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, get(&update, Some(&other_token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, form) = send(&app, get(&update, Some(&owner_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(form["tags"], "a, b");

        let (status, updated) = send(&app, post(&update, Some(&owner_token), edit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Edited");
        assert_eq!(updated["tags"].as_array().unwrap().len(), 0);

        let (status, _) = send(&app, post(&delete, Some(&other_token), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, post(&delete, Some(&owner_token), json!({}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, get(&format!("/blog/post/{id}"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_form_validation() {
        let (app, pool) = test_app().await;
        let (_user, token) = login(&pool, "writer").await;

        let (status, _) = send(&app, post("/blog/post/new", None, json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let long_tag = "t".repeat(101);
        let (status, body) = send(
            &app,
            post(
                "/blog/post/new",
                Some(&token),
                json!({"title": "  ", "content": "", "tags": long_tag}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["title", "content", "tags"] {
            assert!(body["fields"][field].is_array(), "{field} not reported");
        }
    }
}
