//! Collections and the link resources they contain

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Collection {
    pub collection_name: String,
}

/// Resource as listed under a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Resource {
    pub resource_name: String,
    pub link: String,
    pub description: String,
}

/// Create collection request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCollection {
    #[validate(custom(function = "not_blank"))]
    pub collection_name: String,
}

/// Add resource request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateResource {
    #[validate(custom(function = "not_blank"))]
    pub resource_name: String,
    #[validate(custom(function = "not_blank"))]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "not_blank"))]
    pub collection_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_is_optional_but_link_is_not() {
        let resource: CreateResource = serde_json::from_value(serde_json::json!({
            "resource_name": "Rust Book",
            "link": " ",
            "collection_name": "Rust"
        }))
        .unwrap();
        assert_eq!(resource.description, "");

        let errors = resource.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("link"));
        assert!(!errors.field_errors().contains_key("resource_name"));
    }
}
