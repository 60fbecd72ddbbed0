use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CategoryRequest},
    error::AppResult,
    middleware::auth::AdminUser,
    models::Category,
    response::ApiResponse,
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-category", post(create_category))
        .route("/update-category/{id}", put(update_category))
        .route("/get-category", get(list_categories))
        .route("/single-category/{slug}", get(single_category))
        .route("/single-category-id/{id}", get(single_category_by_id))
        .route("/delete-category/{id}", delete(delete_category))
}

#[utoipa::path(
    post,
    path = "/api/v1/category/create-category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created category", body = ApiResponse<Category>),
        (status = 409, description = "Category already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let resp = category_service::create_category(&state, &admin, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/v1/category/update-category/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::update_category(&state, &admin, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/category/get-category",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/category/single-category/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug")
    ),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn single_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category_by_slug(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/category/single-category-id/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn single_category_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category_by_id(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/category/delete-category/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Deleted category"),
        (status = 400, description = "Category still has products"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_category(&state, &admin, id).await?;
    Ok(Json(resp))
}
