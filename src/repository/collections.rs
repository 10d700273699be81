//! Collections and resources repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{is_foreign_key_violation, is_unique_violation};
use crate::{
    error::{AppError, AppResult},
    models::collection::{Collection, CreateResource, Resource},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionsStore: Send + Sync {
    /// `AlreadyExists` if the name is taken
    async fn create(&self, collection_name: &str) -> AppResult<()>;

    /// Delete the collection and all of its resources in one transaction.
    /// Returns the number of resources removed, or None if no such collection
    /// (in which case nothing is changed).
    async fn delete_cascade(&self, collection_name: &str) -> AppResult<Option<u64>>;

    async fn list(&self) -> AppResult<Vec<Collection>>;

    /// `AlreadyExists` on a duplicate (link, collection), `NotFound` if the
    /// collection does not exist
    async fn add_resource(&self, resource: &CreateResource) -> AppResult<()>;

    async fn list_resources(&self, collection_name: &str) -> AppResult<Vec<Resource>>;

    /// Number of rows removed
    async fn delete_resource(&self, collection_name: &str, resource_name: &str) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct CollectionsRepository {
    pool: Pool<Postgres>,
}

impl CollectionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionsStore for CollectionsRepository {
    async fn create(&self, collection_name: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO collection (collection_name) VALUES ($1)")
            .bind(collection_name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AlreadyExists("The collection already exists.".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(())
    }

    async fn delete_cascade(&self, collection_name: &str) -> AppResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let resources = sqlx::query("DELETE FROM resources WHERE collection_name = $1")
            .bind(collection_name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let collections = sqlx::query("DELETE FROM collection WHERE collection_name = $1")
            .bind(collection_name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if collections == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(resources))
    }

    async fn list(&self) -> AppResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            "SELECT DISTINCT collection_name FROM collection ORDER BY collection_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    async fn add_resource(&self, resource: &CreateResource) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO resources (resource_name, link, description, collection_name)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&resource.resource_name)
        .bind(&resource.link)
        .bind(&resource.description)
        .bind(&resource.collection_name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists("Resource already exists".to_string())
            } else if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Collection '{}' not found", resource.collection_name))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn list_resources(&self, collection_name: &str) -> AppResult<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(
            r#"
            SELECT resource_name, link, description
            FROM resources
            WHERE collection_name = $1 AND resource_name <> ''
            ORDER BY id
            "#,
        )
        .bind(collection_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(resources)
    }

    async fn delete_resource(&self, collection_name: &str, resource_name: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM resources WHERE collection_name = $1 AND resource_name = $2",
        )
        .bind(collection_name)
        .bind(resource_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
