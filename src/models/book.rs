//! Book model and borrow state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::not_blank;

/// Book row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    #[serde(skip_serializing)]
    pub id: i32,
    pub book_name: String,
    pub author: String,
    /// Email of the current borrower, if any
    pub borrowed_by: Option<String>,
    pub borrow_date: Option<DateTime<Utc>>,
}

/// Name and author only, as returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub book_name: String,
    pub author: String,
}

/// How many copies of a title exist and how many are out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Availability {
    pub copies: i64,
    pub borrowed: i64,
}

/// Outcome of deleting every copy of a title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(u64),
    NotFound,
    Borrowed,
}

/// Add book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddBook {
    #[validate(custom(function = "not_blank"))]
    pub book_name: String,
    #[validate(custom(function = "not_blank"))]
    pub author: String,
}

/// Borrow / return request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRequest {
    pub book_name: String,
}

/// Prefix search query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-sensitive prefix of the book name
    pub book_name: String,
}
