//! API handlers for BookHub REST endpoints

pub mod auth;
pub mod books;
pub mod collections;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::user::SessionClaims, AppState};

/// Extractor for the calling user, from the Bearer token
pub struct AuthenticatedUser(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("Please login to proceed".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthenticated("Invalid authorization header format".to_string())
        })?;

        let claims = SessionClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// JSON body extractor whose rejections use the error body of every other failure
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Plain confirmation body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Accounts
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/reset-password", post(auth::reset_password))
        .route("/list-users", get(auth::list_users))
        .route("/update-role", post(auth::update_role))
        // Books
        .route("/books", get(books::list_books))
        .route("/add_book", post(books::add_book))
        .route("/delete_book/:book_name", delete(books::delete_book))
        .route("/search", get(books::search_books))
        .route("/borrow", put(books::borrow_book))
        .route("/return", put(books::return_book))
        // Collections
        .route("/add_collection", post(collections::add_collection))
        .route("/delete_collection/:collection_name", delete(collections::delete_collection))
        .route("/collections_list", get(collections::list_collections))
        .route(
            "/collections_list/:collection_name/resources",
            get(collections::list_resources),
        )
        .route("/add_resource", post(collections::add_resource))
        .route(
            "/delete_resource/:collection_name/:resource_name",
            delete(collections::delete_resource),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
