use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Category;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
