//! Books repository: catalog queries and the borrow/return transitions
//!
//! Borrow and return are single conditional UPDATE statements. The guard
//! (`borrowed_by IS NULL` / `borrowed_by = caller`) lives in the same
//! statement as the write, so two callers can never both win a copy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use super::{is_unique_violation, like_prefix};
use crate::{
    error::{AppError, AppResult},
    models::book::{Availability, Book, BookSummary, DeleteOutcome},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// All books in storage order
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Books whose name starts with `prefix` (case-sensitive)
    async fn search_by_prefix(&self, prefix: &str) -> AppResult<Vec<BookSummary>>;

    /// Insert a free book; `AlreadyExists` if the (name, author) pair exists
    async fn create(&self, book_name: &str, author: &str) -> AppResult<()>;

    /// Delete every copy of a title unless one of them is borrowed
    async fn delete_by_name(&self, book_name: &str) -> AppResult<DeleteOutcome>;

    /// Mark one free copy as borrowed by `borrower`. False when no free copy.
    async fn try_borrow(&self, book_name: &str, borrower: &str, at: DateTime<Utc>) -> AppResult<bool>;

    /// Free one copy held by `borrower`. False when the caller holds none.
    async fn try_return(&self, book_name: &str, borrower: &str) -> AppResult<bool>;

    async fn availability(&self, book_name: &str) -> AppResult<Availability>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, book_name, author, borrowed_by, borrow_date FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn search_by_prefix(&self, prefix: &str) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT book_name, author
            FROM books
            WHERE book_name LIKE $1 ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(like_prefix(prefix))
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn create(&self, book_name: &str, author: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO books (book_name, author) VALUES ($1, $2)")
            .bind(book_name)
            .bind(author)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AlreadyExists("Book already exists".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(())
    }

    async fn delete_by_name(&self, book_name: &str) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        // Lock every copy so a concurrent borrow cannot slip in before the delete
        let borrowers = sqlx::query_scalar::<_, Option<String>>(
            "SELECT borrowed_by FROM books WHERE book_name = $1 FOR UPDATE",
        )
        .bind(book_name)
        .fetch_all(&mut *tx)
        .await?;

        if borrowers.is_empty() {
            return Ok(DeleteOutcome::NotFound);
        }
        if borrowers.iter().any(Option::is_some) {
            return Ok(DeleteOutcome::Borrowed);
        }

        let result = sqlx::query("DELETE FROM books WHERE book_name = $1")
            .bind(book_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DeleteOutcome::Deleted(result.rows_affected()))
    }

    async fn try_borrow(&self, book_name: &str, borrower: &str, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET borrowed_by = $2, borrow_date = $3
            WHERE id = (
                SELECT id FROM books
                WHERE book_name = $1 AND borrowed_by IS NULL
                ORDER BY id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND borrowed_by IS NULL
            "#,
        )
        .bind(book_name)
        .bind(borrower)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn try_return(&self, book_name: &str, borrower: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET borrowed_by = NULL, borrow_date = NULL
            WHERE id = (
                SELECT id FROM books
                WHERE book_name = $1 AND borrowed_by = $2
                ORDER BY borrow_date, id
                LIMIT 1
                FOR UPDATE
            )
            AND borrowed_by = $2
            "#,
        )
        .bind(book_name)
        .bind(borrower)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn availability(&self, book_name: &str) -> AppResult<Availability> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS copies,
                   COUNT(borrowed_by) AS borrowed
            FROM books
            WHERE book_name = $1
            "#,
        )
        .bind(book_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(Availability {
            copies: row.get("copies"),
            borrowed: row.get("borrowed"),
        })
    }
}
