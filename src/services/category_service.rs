use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::categories::{CategoryList, CategoryRequest},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::{Category, slug_for},
    response::{ApiResponse, Meta},
    services::required,
    state::AppState,
};

pub async fn create_category(
    state: &AppState,
    admin: &AdminUser,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let name = required(payload.name, "Name is required")?;
    if state.store.find_category_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict("Category already exists".into()));
    }

    let category = state.store.insert_category(name.clone(), slug_for(&name)).await?;

    log_audit(
        state,
        Some(admin.0.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "New category created",
        category,
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let name = required(payload.name, "Name is required")?;
    if let Some(existing) = state.store.find_category_by_name(&name).await? {
        if existing.id != id {
            return Err(AppError::Conflict("Category already exists".into()));
        }
    }

    let category = state
        .store
        .update_category(id, name.clone(), slug_for(&name))
        .await?
        .ok_or(AppError::NotFound)?;

    log_audit(
        state,
        Some(admin.0.user_id),
        "category_update",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated",
        category,
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = state.store.list_categories().await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "All categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_category_by_slug(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<Category>> {
    let category = state
        .store
        .find_category_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Category", category, None))
}

pub async fn get_category_by_id(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = state
        .store
        .find_category_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Category", category, None))
}

pub async fn delete_category(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let in_use = state.store.count_products_in_category(id).await?;
    if in_use > 0 {
        return Err(AppError::BadRequest(format!(
            "Category still has {in_use} product(s)"
        )));
    }

    if !state.store.delete_category(id).await? {
        return Err(AppError::NotFound);
    }

    log_audit(
        state,
        Some(admin.0.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Category deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
