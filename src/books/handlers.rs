use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{BooksPage, CreateBookRequest, ListBooksQuery, MessageResponse},
    repo_types::Book,
    services::{self, PageRequest},
};
use crate::{
    auth::extractors::AuthUser,
    error::ApiResult,
    extractors::{ApiJson, ApiQuery},
    state::AppState,
};

/// Inline base64 images make bodies large.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", post(create_book).get(list_books))
        .route("/books/user", get(list_user_books))
        .route("/books/:id", delete(delete_book))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateBookRequest>,
) -> ApiResult<Json<Book>> {
    let book = services::create_book(state.books.as_ref(), state.images.as_ref(), user.id, body).await?;
    Ok(Json(book))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_books(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(q): ApiQuery<ListBooksQuery>,
) -> ApiResult<Json<BooksPage>> {
    let page = PageRequest::from_query(&q)?;
    let res = services::list_books(state.books.as_ref(), page).await?;
    Ok(Json(res))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_user_books(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Book>>> {
    let books = services::list_user_books(state.books.as_ref(), user.id).await?;
    Ok(Json(books))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    services::delete_book(state.books.as_ref(), state.images.as_ref(), user.id, &id).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".into(),
    }))
}
