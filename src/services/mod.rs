//! Business logic services

pub mod auth;
pub mod books;
pub mod collections;
pub mod events;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

use events::EventPublisher;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub collections: collections::CollectionsService,
}

impl Services {
    /// Create all services over one repository and one event sink
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config, publisher.clone()),
            books: books::BooksService::new(repository.clone(), publisher.clone()),
            collections: collections::CollectionsService::new(repository, publisher),
        }
    }
}
