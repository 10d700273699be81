//! Collections and resources service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::collection::{Collection, CreateCollection, CreateResource, Resource},
    repository::Repository,
    services::events::{DomainEvent, EventPublisher},
};

#[derive(Clone)]
pub struct CollectionsService {
    repository: Repository,
    events: Arc<dyn EventPublisher>,
}

impl CollectionsService {
    pub fn new(repository: Repository, events: Arc<dyn EventPublisher>) -> Self {
        Self { repository, events }
    }

    pub async fn create(&self, request: CreateCollection) -> AppResult<()> {
        request.validate()?;

        self.repository.collections.create(&request.collection_name).await?;

        tracing::info!(collection = %request.collection_name, "Collection created");
        self.events.publish(DomainEvent::CollectionCreated {
            collection_name: request.collection_name,
        });

        Ok(())
    }

    /// Remove a collection along with its resources
    pub async fn delete(&self, collection_name: &str) -> AppResult<()> {
        let removed = self
            .repository
            .collections
            .delete_cascade(collection_name)
            .await?
            .ok_or_else(|| AppError::NotFound("The collection was not found.".to_string()))?;

        tracing::info!(collection = %collection_name, resources = removed, "Collection deleted");
        self.events.publish(DomainEvent::CollectionDeleted {
            collection_name: collection_name.to_string(),
        });

        Ok(())
    }

    pub async fn list(&self) -> AppResult<Vec<Collection>> {
        self.repository.collections.list().await
    }

    pub async fn add_resource(&self, resource: CreateResource) -> AppResult<()> {
        resource.validate()?;

        self.repository.collections.add_resource(&resource).await?;

        tracing::info!(
            collection = %resource.collection_name,
            resource = %resource.resource_name,
            "Resource added"
        );
        self.events.publish(DomainEvent::ResourceAdded {
            resource_name: resource.resource_name,
            link: resource.link,
            collection_name: resource.collection_name,
        });

        Ok(())
    }

    pub async fn list_resources(&self, collection_name: &str) -> AppResult<Vec<Resource>> {
        let resources = self.repository.collections.list_resources(collection_name).await?;

        if resources.is_empty() {
            return Err(AppError::NotFound(
                "No resources found for this collection".to_string(),
            ));
        }

        Ok(resources)
    }

    pub async fn delete_resource(&self, collection_name: &str, resource_name: &str) -> AppResult<()> {
        let deleted = self
            .repository
            .collections
            .delete_resource(collection_name, resource_name)
            .await?;

        if deleted == 0 {
            return Err(AppError::NotFound(format!(
                "Resource '{}' not found in collection '{}'",
                resource_name, collection_name
            )));
        }

        tracing::info!(collection = %collection_name, resource = %resource_name, "Resource deleted");
        self.events.publish(DomainEvent::ResourceDeleted {
            resource_name: resource_name.to_string(),
            collection_name: collection_name.to_string(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repository::{
            books::MockBooksStore, collections::MockCollectionsStore, users::MockUsersStore,
        },
        services::events::RecordingPublisher,
    };

    fn service(collections: MockCollectionsStore) -> (CollectionsService, Arc<RecordingPublisher>) {
        let repository = Repository::from_stores(
            Arc::new(MockUsersStore::new()),
            Arc::new(MockBooksStore::new()),
            Arc::new(collections),
        );
        let events = Arc::new(RecordingPublisher::default());
        (CollectionsService::new(repository, events.clone()), events)
    }

    fn resource(collection: &str) -> CreateResource {
        CreateResource {
            resource_name: "Rust Book".to_string(),
            link: "https://doc.rust-lang.org/book/".to_string(),
            description: String::new(),
            collection_name: collection.to_string(),
        }
    }

    #[tokio::test]
    async fn blank_collection_name_is_invalid() {
        let mut collections = MockCollectionsStore::new();
        collections.expect_create().never();
        let (service, _) = service(collections);

        let err = service
            .create(CreateCollection {
                collection_name: "  ".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn delete_of_missing_collection_is_not_found_and_silent() {
        let mut collections = MockCollectionsStore::new();
        collections.expect_delete_cascade().returning(|_| Ok(None));
        let (service, events) = service(collections);

        assert!(matches!(service.delete("Nope").await, Err(AppError::NotFound(_))));
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_and_publishes() {
        let mut collections = MockCollectionsStore::new();
        collections
            .expect_delete_cascade()
            .withf(|name| name == "Rust")
            .times(1)
            .returning(|_| Ok(Some(3)));
        let (service, events) = service(collections);

        service.delete("Rust").await.unwrap();

        assert_eq!(
            events.events(),
            vec![DomainEvent::CollectionDeleted {
                collection_name: "Rust".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn empty_resource_list_is_not_found() {
        let mut collections = MockCollectionsStore::new();
        collections.expect_list_resources().returning(|_| Ok(vec![]));
        let (service, _) = service(collections);

        assert!(matches!(
            service.list_resources("Rust").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn resource_for_unknown_collection_is_not_found() {
        let mut collections = MockCollectionsStore::new();
        collections
            .expect_add_resource()
            .returning(|r| Err(AppError::NotFound(format!("Collection '{}' not found", r.collection_name))));
        let (service, events) = service(collections);

        assert!(matches!(
            service.add_resource(resource("Ghost")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn added_resource_is_published_with_its_link() {
        let mut collections = MockCollectionsStore::new();
        collections.expect_add_resource().times(1).returning(|_| Ok(()));
        let (service, events) = service(collections);

        service.add_resource(resource("Rust")).await.unwrap();

        assert_eq!(
            events.events(),
            vec![DomainEvent::ResourceAdded {
                resource_name: "Rust Book".to_string(),
                link: "https://doc.rust-lang.org/book/".to_string(),
                collection_name: "Rust".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn deleting_absent_resource_is_not_found() {
        let mut collections = MockCollectionsStore::new();
        collections.expect_delete_resource().returning(|_, _| Ok(0));
        let (service, _) = service(collections);

        assert!(matches!(
            service.delete_resource("Rust", "Nomicon").await,
            Err(AppError::NotFound(_))
        ));
    }
}
