//! Collection and resource endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppResult,
    models::collection::{Collection, CreateCollection, CreateResource, Resource},
    AppState,
};

use super::{Json, MessageResponse};

/// Create a collection
#[utoipa::path(
    post,
    path = "/add_collection",
    tag = "collections",
    request_body = CreateCollection,
    responses(
        (status = 201, description = "Collection created", body = MessageResponse),
        (status = 400, description = "Blank name", body = crate::error::ErrorResponse),
        (status = 409, description = "Collection already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.collections.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Collection created successfully")),
    ))
}

/// Delete a collection and its resources
#[utoipa::path(
    delete,
    path = "/delete_collection/{collection_name}",
    tag = "collections",
    params(
        ("collection_name" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 404, description = "Collection not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(collection_name): Path<String>,
) -> AppResult<StatusCode> {
    state.services.collections.delete(&collection_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List collection names
#[utoipa::path(
    get,
    path = "/collections_list",
    tag = "collections",
    responses(
        (status = 200, description = "All collections", body = Vec<Collection>)
    )
)]
pub async fn list_collections(State(state): State<AppState>) -> AppResult<Json<Vec<Collection>>> {
    let collections = state.services.collections.list().await?;
    Ok(Json(collections))
}

/// List resources of a collection
#[utoipa::path(
    get,
    path = "/collections_list/{collection_name}/resources",
    tag = "collections",
    params(
        ("collection_name" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 200, description = "Resources of the collection", body = Vec<Resource>),
        (status = 404, description = "No resources", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_resources(
    State(state): State<AppState>,
    Path(collection_name): Path<String>,
) -> AppResult<Json<Vec<Resource>>> {
    let resources = state.services.collections.list_resources(&collection_name).await?;
    Ok(Json(resources))
}

/// Add a resource to a collection
#[utoipa::path(
    post,
    path = "/add_resource",
    tag = "collections",
    request_body = CreateResource,
    responses(
        (status = 200, description = "Resource added", body = MessageResponse),
        (status = 400, description = "Blank field", body = crate::error::ErrorResponse),
        (status = 404, description = "Collection not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Link already in collection", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_resource(
    State(state): State<AppState>,
    Json(resource): Json<CreateResource>,
) -> AppResult<Json<MessageResponse>> {
    state.services.collections.add_resource(resource).await?;
    Ok(Json(MessageResponse::new("Resource added successfully")))
}

/// Remove a resource from a collection
#[utoipa::path(
    delete,
    path = "/delete_resource/{collection_name}/{resource_name}",
    tag = "collections",
    params(
        ("collection_name" = String, Path, description = "Collection name"),
        ("resource_name" = String, Path, description = "Resource name")
    ),
    responses(
        (status = 200, description = "Resource deleted", body = MessageResponse),
        (status = 404, description = "Resource not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_resource(
    State(state): State<AppState>,
    Path((collection_name, resource_name)): Path<(String, String)>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .collections
        .delete_resource(&collection_name, &resource_name)
        .await?;
    Ok(Json(MessageResponse::new("Resource deleted successfully")))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::{
        api::{router, test_support},
        repository::{
            books::MockBooksStore, collections::MockCollectionsStore, users::MockUsersStore,
        },
    };

    use super::*;

    fn app(collections: MockCollectionsStore) -> axum::Router {
        router(test_support::state(
            MockUsersStore::new(),
            MockBooksStore::new(),
            collections,
        ))
    }

    #[tokio::test]
    async fn delete_collection_answers_no_content() {
        let mut collections = MockCollectionsStore::new();
        collections.expect_delete_cascade().returning(|_| Ok(Some(0)));

        let response = app(collections)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/delete_collection/Rust")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn resources_of_empty_collection_are_not_found() {
        let mut collections = MockCollectionsStore::new();
        collections
            .expect_list_resources()
            .withf(|name| name == "Rust")
            .returning(|_| Ok(vec![]));

        let response = app(collections)
            .oneshot(
                Request::builder()
                    .uri("/collections_list/Rust/resources")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "NotFound");
    }

    #[tokio::test]
    async fn delete_resource_reads_both_path_segments() {
        let mut collections = MockCollectionsStore::new();
        collections
            .expect_delete_resource()
            .withf(|collection, resource| collection == "Rust" && resource == "Nomicon")
            .times(1)
            .returning(|_, _| Ok(1));

        let response = app(collections)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/delete_resource/Rust/Nomicon")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
