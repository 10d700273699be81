//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, collections, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookHub API",
        version = "0.1.0",
        description = "Small library service: books, borrowing and link collections"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        auth::login,
        auth::signup,
        auth::reset_password,
        auth::list_users,
        auth::update_role,
        // Books
        books::list_books,
        books::search_books,
        books::add_book,
        books::delete_book,
        books::borrow_book,
        books::return_book,
        // Collections
        collections::add_collection,
        collections::delete_collection,
        collections::list_collections,
        collections::list_resources,
        collections::add_resource,
        collections::delete_resource,
    ),
    components(
        schemas(
            // Accounts
            auth::LoginResponse,
            auth::UsersResponse,
            crate::models::user::Role,
            crate::models::user::UserSummary,
            crate::models::user::SignupRequest,
            crate::models::user::LoginRequest,
            crate::models::user::ResetPasswordRequest,
            crate::models::user::UpdateRoleRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::AddBook,
            crate::models::book::BookRequest,
            // Collections
            crate::models::collection::Collection,
            crate::models::collection::Resource,
            crate::models::collection::CreateCollection,
            crate::models::collection::CreateResource,
            // Common
            crate::api::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "books", description = "Book catalog and borrowing"),
        (name = "collections", description = "Link collections and their resources")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
