//! Book catalog and borrow/return endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    error::AppResult,
    models::book::{AddBook, Book, BookRequest, BookSummary, SearchQuery},
    AppState,
};

use super::{AuthenticatedUser, Json, MessageResponse};

/// List every book with its borrow state
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Search books by name prefix
#[utoipa::path(
    get,
    path = "/search",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookSummary>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<BookSummary>>> {
    let books = state.services.books.search(&query.book_name).await?;
    Ok(Json(books))
}

/// Add a book
#[utoipa::path(
    post,
    path = "/add_book",
    tag = "books",
    request_body = AddBook,
    responses(
        (status = 201, description = "Book added", body = MessageResponse),
        (status = 400, description = "Blank name or author", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    Json(book): Json<AddBook>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.books.add(book).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Book added successfully"))))
}

/// Delete every copy of a book
#[utoipa::path(
    delete,
    path = "/delete_book/{book_name}",
    tag = "books",
    params(
        ("book_name" = String, Path, description = "Book name")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(book_name): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete(&book_name).await?;
    Ok(Json(MessageResponse::new("Book deleted successfully")))
}

/// Borrow a free copy of a book
#[utoipa::path(
    put,
    path = "/borrow",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book borrowed", body = MessageResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Every copy is borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BookRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.borrow(&request.book_name, &claims).await?;
    Ok(Json(MessageResponse::new("Book borrowed successfully")))
}

/// Return a book held by the caller
#[utoipa::path(
    put,
    path = "/return",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Not borrowed by the caller", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BookRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.return_book(&request.book_name, &claims).await?;
    Ok(Json(MessageResponse::new("Book returned successfully")))
}
