//! Bookshelf endpoints under `/bookshelf`

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{ShelfBook, ShelfFilter, ShelfRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{FormErrors, PublicationYear, ShelfAuthor, Title};

#[derive(Deserialize)]
pub struct CreateShelfBookRequest {
    pub title: String,
    pub author: String,
    pub publication_year: i64,
}

/// GET /bookshelf/books?q=&publication_year=&author=
pub(crate) async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShelfFilter>,
) -> Result<Json<Vec<ShelfBook>>, ApiError> {
    let books = ShelfRepo::new(&state.pool).list(&filter).await?;
    Ok(Json(books))
}

/// POST /bookshelf/books
async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateShelfBookRequest>,
) -> Result<(StatusCode, Json<ShelfBook>), ApiError> {
    let title = Title::new(&req.title);
    let author = ShelfAuthor::new(&req.author);
    let year = PublicationYear::new(req.publication_year);

    let (title, author, year) = match (title, author, year) {
        (Ok(t), Ok(a), Ok(y)) => (t, a, y),
        (t, a, y) => return Err(FormErrors::collect([t.err(), a.err(), y.err()]).into()),
    };

    let book = ShelfRepo::new(&state.pool).create(&title, &author, year).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /bookshelf/books/{id}
async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ShelfBook>, ApiError> {
    let book = ShelfRepo::new(&state.pool).get(id).await?;
    Ok(Json(book))
}

/// DELETE /bookshelf/books/{id}
async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ShelfRepo::new(&state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bookshelf routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookshelf/books", get(list_books).post(create_book))
        .route("/bookshelf/books/{id}", get(get_book).delete(delete_book))
}

#[cfg(test)]
mod tests {
    use crate::testing::{get, post, request, send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn shelve_search_and_remove() {
        let (app, _pool) = test_app().await;

        for (title, author, year) in [
            ("1984", "George Orwell", 1949),
            ("Animal Farm", "George Orwell", 1945),
            ("Emma", "Jane Austen", 1815),
        ] {
            let (status, _) = send(
                &app,
                post(
                    "/bookshelf/books",
                    None,
                    json!({"title": title, "author": author, "publication_year": year}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, found) = send(&app, get("/bookshelf/books?q=1984", None)).await;
        assert_eq!(status, StatusCode::OK);
        let found = found.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["title"], "1984");

        let (_, by_year) = send(&app, get("/bookshelf/books?publication_year=1815", None)).await;
        assert_eq!(by_year[0]["author"], "Jane Austen");

        let id = found[0]["id"].as_i64().unwrap();
        let uri = format!("/bookshelf/books/{id}");
        let (status, _) = send(&app, request(Method::DELETE, &uri, None, None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, get(&uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn every_bad_field_is_reported() {
        let (app, _pool) = test_app().await;

        let (status, body) = send(
            &app,
            post(
                "/bookshelf/books",
                None,
                json!({"title": "", "author": "", "publication_year": 12345}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["title", "author", "publication_year"] {
            assert!(body["fields"][field].is_array(), "{field} not reported");
        }
    }
}
