//! HTTP handlers for the library API. Bodies are validated here, before the
//! service sees them.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use shelf_http::error::AppError;

use super::error::LibraryError;
use super::models::{Book, BookId, Borrower, BorrowerId};
use super::service::LibraryService;
use super::validation::{self, BookPayload, BorrowerPayload};

pub fn router(service: LibraryService) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/borrowers", post(register_borrower))
        .route("/books", post(register_book).get(list_books))
        .route("/books/bulk", post(register_books))
        .route("/borrow/{book_id}/borrower/{borrower_id}", post(borrow_book))
        .route("/return/{book_id}", post(return_book))
        .with_state(service)
}

fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

fn malformed_path(rejection: PathRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

async fn health_check() -> &'static str {
    "library module is healthy"
}

async fn register_borrower(
    State(service): State<LibraryService>,
    body: Result<Json<BorrowerPayload>, JsonRejection>,
) -> Result<Json<Borrower>, AppError> {
    let Json(payload) = body.map_err(malformed_body)?;
    let draft = payload.validate().map_err(LibraryError::Validation)?;
    Ok(Json(service.register_borrower(draft).await?))
}

async fn register_book(
    State(service): State<LibraryService>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(payload) = body.map_err(malformed_body)?;
    let draft = payload.validate().map_err(LibraryError::Validation)?;
    Ok(Json(service.register_book(draft).await?))
}

async fn register_books(
    State(service): State<LibraryService>,
    body: Result<Json<Vec<BookPayload>>, JsonRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Json(payloads) = body.map_err(malformed_body)?;
    let drafts = validation::validate_books(payloads).map_err(LibraryError::Validation)?;
    Ok(Json(service.register_books(drafts).await?))
}

async fn list_books(State(service): State<LibraryService>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.get_all_books().await?))
}

async fn borrow_book(
    State(service): State<LibraryService>,
    path: Result<Path<(BookId, BorrowerId)>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path((book_id, borrower_id)) = path.map_err(malformed_path)?;
    Ok(Json(service.borrow_book(book_id, borrower_id).await?))
}

async fn return_book(
    State(service): State<LibraryService>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(book_id) = path.map_err(malformed_path)?;
    Ok(Json(service.return_book(book_id).await?))
}
