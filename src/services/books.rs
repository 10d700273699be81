//! Book catalog and borrow/return service

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{AddBook, Book, BookSummary, DeleteOutcome},
        user::SessionClaims,
    },
    repository::Repository,
    services::events::{DomainEvent, EventPublisher},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    events: Arc<dyn EventPublisher>,
}

impl BooksService {
    pub fn new(repository: Repository, events: Arc<dyn EventPublisher>) -> Self {
        Self { repository, events }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn search(&self, prefix: &str) -> AppResult<Vec<BookSummary>> {
        self.repository.books.search_by_prefix(prefix).await
    }

    pub async fn add(&self, book: AddBook) -> AppResult<()> {
        book.validate()?;

        self.repository.books.create(&book.book_name, &book.author).await?;

        tracing::info!(book = %book.book_name, author = %book.author, "Book added");
        self.events.publish(DomainEvent::BookAdded {
            book_name: book.book_name,
            author: book.author,
        });

        Ok(())
    }

    /// Delete every copy of a title. Refused while any copy is out.
    pub async fn delete(&self, book_name: &str) -> AppResult<u64> {
        match self.repository.books.delete_by_name(book_name).await? {
            DeleteOutcome::NotFound => Err(AppError::NotFound("Book not found".to_string())),
            DeleteOutcome::Borrowed => Err(AppError::Conflict(
                "Cannot delete a borrowed book".to_string(),
            )),
            DeleteOutcome::Deleted(count) => {
                tracing::info!(book = %book_name, copies = count, "Book deleted");
                self.events.publish(DomainEvent::BookDeleted {
                    book_name: book_name.to_string(),
                });
                Ok(count)
            }
        }
    }

    /// Hand one free copy of `book_name` to the caller
    pub async fn borrow(&self, book_name: &str, caller: &SessionClaims) -> AppResult<()> {
        let borrowed = self
            .repository
            .books
            .try_borrow(book_name, caller.email(), Utc::now())
            .await?;

        if !borrowed {
            // The update already lost; this lookup only picks the error
            let availability = self.repository.books.availability(book_name).await?;
            return Err(if availability.copies == 0 {
                AppError::NotFound("Book not found".to_string())
            } else {
                AppError::Conflict("Book is already borrowed".to_string())
            });
        }

        tracing::info!(book = %book_name, user = %caller.email(), "Book borrowed");
        self.events.publish(DomainEvent::BookBorrowed {
            book_name: book_name.to_string(),
            user: caller.email().to_string(),
        });

        Ok(())
    }

    /// Give back a copy the caller holds
    pub async fn return_book(&self, book_name: &str, caller: &SessionClaims) -> AppResult<()> {
        let returned = self
            .repository
            .books
            .try_return(book_name, caller.email())
            .await?;

        if !returned {
            return Err(AppError::Forbidden(
                "You can only return books borrowed by you".to_string(),
            ));
        }

        tracing::info!(book = %book_name, user = %caller.email(), "Book returned");
        self.events.publish(DomainEvent::BookReturned {
            book_name: book_name.to_string(),
            user: caller.email().to_string(),
        });

        Ok(())
    }
}
