use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product};

/// Create/update form as submitted by the admin console (multipart fields).
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<String>,
    pub shipping: Option<String>,
    pub photo: Option<PhotoUpload>,
}

#[derive(Debug)]
pub struct PhotoUpload {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductFilterRequest {
    /// Category ids; empty means any category.
    #[serde(default)]
    pub checked: Vec<Uuid>,
    /// Either empty or `[min, max]` price bounds, inclusive.
    #[serde(default)]
    pub radio: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCount {
    pub total: u64,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryProducts {
    pub category: Category,
    pub items: Vec<Product>,
}
