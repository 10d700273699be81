//! Repository layer for database operations
//!
//! Each store is a trait so services can be exercised without a database;
//! the PostgreSQL implementations live next to their trait.

pub mod books;
pub mod collections;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::{BooksRepository, BooksStore};
pub use collections::{CollectionsRepository, CollectionsStore};
pub use users::{UsersRepository, UsersStore};

/// Main repository struct holding the store handles
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersStore>,
    pub books: Arc<dyn BooksStore>,
    pub collections: Arc<dyn CollectionsStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(UsersRepository::new(pool.clone())),
            books: Arc::new(BooksRepository::new(pool.clone())),
            collections: Arc::new(CollectionsRepository::new(pool)),
        }
    }

    /// Assemble a repository from arbitrary store implementations
    pub fn from_stores(
        users: Arc<dyn UsersStore>,
        books: Arc<dyn BooksStore>,
        collections: Arc<dyn CollectionsStore>,
    ) -> Self {
        Self {
            users,
            books,
            collections,
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Turn a user-supplied prefix into a LIKE pattern matching it literally
pub(crate) fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
