//! Data models for BookHub

pub mod book;
pub mod collection;
pub mod user;

use std::borrow::Cow;

use validator::ValidationError;

// Re-export commonly used types
pub use book::{Availability, Book, BookSummary};
pub use collection::{Collection, Resource};
pub use user::{Role, SessionClaims, User, UserSummary};

/// Rejects empty and whitespace-only strings
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("must not be empty"));
        return Err(error);
    }
    Ok(())
}
