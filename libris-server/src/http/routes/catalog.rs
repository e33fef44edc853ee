//! Catalog endpoints under `/relationship`
//!
//! Authors, books, libraries, and librarians. Registration for this part of
//! the site lives with the other account routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{
    Author, AuthorWithBooks, Book, BookWithAuthor, CatalogRepo, Librarian, Library, LibraryDetail,
};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{Name, Title};

#[derive(Deserialize)]
pub struct CreateAuthorRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author_id: i64,
}

#[derive(Deserialize)]
pub struct CreateLibraryRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct AddBooksRequest {
    pub book_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct CreateLibrarianRequest {
    pub name: String,
    pub library_id: i64,
}

/// GET /relationship/books - every book with its author
async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookWithAuthor>>, ApiError> {
    let books = CatalogRepo::new(&state.pool).list_books().await?;
    Ok(Json(books))
}

/// POST /relationship/books
async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let title = Title::new(&req.title)?;
    let book = CatalogRepo::new(&state.pool)
        .create_book(&title, req.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// POST /relationship/authors
async fn create_author(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAuthorRequest>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let name = Name::new(&req.name)?;
    let author = CatalogRepo::new(&state.pool).create_author(&name).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// GET /relationship/authors/{id} - author with their books
async fn get_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorWithBooks>, ApiError> {
    let author = CatalogRepo::new(&state.pool).author_with_books(id).await?;
    Ok(Json(author))
}

/// DELETE /relationship/authors/{id} - also removes the author's books
async fn delete_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    CatalogRepo::new(&state.pool).delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /relationship/libraries
async fn create_library(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLibraryRequest>,
) -> Result<(StatusCode, Json<Library>), ApiError> {
    let name = Name::new(&req.name)?;
    let library = CatalogRepo::new(&state.pool).create_library(&name).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// GET /relationship/library - detail of the first library
async fn first_library(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LibraryDetail>, ApiError> {
    let repo = CatalogRepo::new(&state.pool);
    let library = repo.first_library().await?.ok_or(ApiError::NotFound {
        resource: "library",
        id: "first".into(),
    })?;
    Ok(Json(repo.library_detail(library.id).await?))
}

/// GET /relationship/library/{id}
async fn library_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<LibraryDetail>, ApiError> {
    let detail = CatalogRepo::new(&state.pool).library_detail(id).await?;
    Ok(Json(detail))
}

/// DELETE /relationship/library/{id} - also removes its librarian
async fn delete_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    CatalogRepo::new(&state.pool).delete_library(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /relationship/library/{id}/books
async fn add_books(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<AddBooksRequest>,
) -> Result<Json<LibraryDetail>, ApiError> {
    let repo = CatalogRepo::new(&state.pool);
    repo.add_books(id, &req.book_ids).await?;
    Ok(Json(repo.library_detail(id).await?))
}

/// DELETE /relationship/library/{id}/books/{book_id}
async fn remove_book(
    State(state): State<Arc<AppState>>,
    Path((id, book_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    CatalogRepo::new(&state.pool).remove_book(id, book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /relationship/librarians - at most one per library
async fn create_librarian(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLibrarianRequest>,
) -> Result<(StatusCode, Json<Librarian>), ApiError> {
    let name = Name::new(&req.name)?;
    let librarian = CatalogRepo::new(&state.pool)
        .create_librarian(&name, req.library_id)
        .await?;
    Ok((StatusCode::CREATED, Json(librarian)))
}

/// Catalog routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/relationship/books", get(list_books).post(create_book))
        .route("/relationship/authors", post(create_author))
        .route(
            "/relationship/authors/{id}",
            get(get_author).delete(delete_author),
        )
        .route("/relationship/libraries", post(create_library))
        .route("/relationship/library", get(first_library))
        .route(
            "/relationship/library/{id}",
            get(library_detail).delete(delete_library),
        )
        .route("/relationship/library/{id}/books", post(add_books))
        .route(
            "/relationship/library/{id}/books/{book_id}",
            delete(remove_book),
        )
        .route("/relationship/librarians", post(create_librarian))
}
