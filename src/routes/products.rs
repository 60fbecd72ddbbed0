use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::products::{
        CategoryProducts, PhotoUpload, ProductCount, ProductFilterRequest, ProductForm, ProductList,
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Product,
    response::ApiResponse,
    routes::{params::ProductQuery, payment},
    services::product_service,
    state::AppState,
};

/// Multipart body of the create and update routes. Only used for the API docs.
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
pub struct ProductUpload {
    name: String,
    description: String,
    /// Minor currency units.
    price: String,
    /// Category ID.
    category: String,
    quantity: String,
    shipping: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    photo: Option<Vec<u8>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-product", post(create_product))
        .route("/update-product/{pid}", put(update_product))
        .route("/delete-product/{pid}", delete(delete_product))
        .route("/get-product", get(list_products))
        .route("/get-product/{slug}", get(get_product))
        .route("/product-photo/{pid}", get(product_photo))
        .route("/product-filters", post(filter_products))
        .route("/product-count", get(product_count))
        .route("/product-list/{page}", get(product_page))
        .route("/search/{keyword}", get(search_products))
        .route("/related-product/{pid}/{cid}", get(related_products))
        .route("/product-category/{slug}", get(products_by_category))
        .merge(payment::router())
}

fn bad_form(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {}", err.body_text()))
}

async fn read_product_form(mut multipart: Multipart) -> AppResult<ProductForm> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "photo" {
            let content_type = field.content_type().map(str::to_owned);
            let data = field.bytes().await.map_err(bad_form)?;
            if !data.is_empty() {
                form.photo = Some(PhotoUpload {
                    data: data.to_vec(),
                    content_type,
                });
            }
            continue;
        }
        let value = field.text().await.map_err(bad_form)?;
        match name.as_str() {
            "name" => form.name = Some(value),
            "description" => form.description = Some(value),
            "price" => form.price = Some(value),
            "category" => form.category = Some(value),
            "quantity" => form.quantity = Some(value),
            "shipping" => form.shipping = Some(value),
            other => tracing::debug!(field = other, "ignoring unknown product form field"),
        }
    }
    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/v1/product/create-product",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created product", body = ApiResponse<Product>),
        (status = 400, description = "Missing or invalid field"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let form = read_product_form(multipart).await?;
    let resp = product_service::create_product(&state, &admin, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/v1/product/update-product/{pid}",
    params(
        ("pid" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(pid): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = read_product_form(multipart).await?;
    let resp = product_service::update_product(&state, &admin, pid, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/product/delete-product/{pid}",
    params(
        ("pid" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(pid): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &admin, pid).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/get-product",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 12"),
        ("q" = Option<String>, Query, description = "Keyword in name or description"),
        ("min_price" = Option<i64>, Query, description = "Lowest price, minor units"),
        ("max_price" = Option<i64>, Query, description = "Highest price, minor units"),
        ("sort_by" = Option<String>, Query, description = "created_at, price or name"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Newest products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/get-product/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/product-photo/{pid}",
    params(
        ("pid" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Photo bytes with their stored content type"),
        (status = 404, description = "No photo")
    ),
    tag = "Products"
)]
pub async fn product_photo(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
) -> AppResult<Response> {
    let photo = product_service::product_photo(&state, pid).await?;
    Ok(([(header::CONTENT_TYPE, photo.content_type)], photo.data).into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/product/product-filters",
    request_body = ProductFilterRequest,
    responses(
        (status = 200, description = "Matching products", body = ApiResponse<ProductList>),
        (status = 400, description = "Malformed price range")
    ),
    tag = "Products"
)]
pub async fn filter_products(
    State(state): State<AppState>,
    Json(payload): Json<ProductFilterRequest>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::filter_products(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/product-count",
    responses(
        (status = 200, description = "Number of products", body = ApiResponse<ProductCount>)
    ),
    tag = "Products"
)]
pub async fn product_count(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductCount>>> {
    let resp = product_service::product_count(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/product-list/{page}",
    params(
        ("page" = u64, Path, description = "Page number, 5 products per page")
    ),
    responses(
        (status = 200, description = "One page of products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn product_page(
    State(state): State<AppState>,
    Path(page): Path<u64>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::product_page(&state, page).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/search/{keyword}",
    params(
        ("keyword" = String, Path, description = "Case-insensitive keyword")
    ),
    responses(
        (status = 200, description = "Matching products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::search_products(&state, &keyword).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/related-product/{pid}/{cid}",
    params(
        ("pid" = Uuid, Path, description = "Product ID to exclude"),
        ("cid" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Up to three related products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn related_products(
    State(state): State<AppState>,
    Path((pid, cid)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::related_products(&state, pid, cid).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/product-category/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug")
    ),
    responses(
        (status = 200, description = "Category with its products", body = ApiResponse<CategoryProducts>),
        (status = 404, description = "Category not found")
    ),
    tag = "Products"
)]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<CategoryProducts>>> {
    let resp = product_service::products_by_category(&state, &slug).await?;
    Ok(Json(resp))
}
