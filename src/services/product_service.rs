use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        CategoryProducts, PhotoUpload, ProductCount, ProductFilterRequest, ProductForm, ProductList,
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::{PhotoBlob, Product, ProductDraft, ProductPhoto, slug_for},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::required,
    state::AppState,
    store::{PageRequest, ProductFilter, ProductSort},
};

pub const MAX_PHOTO_BYTES: usize = 1_000_000;
pub const LATEST_LIMIT: i64 = 12;
pub const PAGE_SIZE: u64 = 5;
pub const RELATED_LIMIT: u64 = 3;

struct ValidForm {
    draft: ProductDraft,
    photo: Option<PhotoBlob>,
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{field} must be a whole number")))
}

fn parse_shipping(value: Option<&str>) -> AppResult<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(AppError::BadRequest(format!(
            "Shipping must be yes or no, got `{other}`"
        ))),
    }
}

async fn validate_form(state: &AppState, form: ProductForm) -> AppResult<ValidForm> {
    let name = required(form.name, "Name is required")?;
    let description = required(form.description, "Description is required")?;
    let price: i64 = parse_number(&required(form.price, "Price is required")?, "Price")?;
    let category = required(form.category, "Category is required")?;
    let quantity: i32 =
        parse_number(&required(form.quantity, "Quantity is required")?, "Quantity")?;
    let shipping = parse_shipping(form.shipping.as_deref())?;

    if price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if quantity < 0 {
        return Err(AppError::BadRequest("Quantity must not be negative".into()));
    }
    if let Some(photo) = &form.photo {
        if photo.data.len() > MAX_PHOTO_BYTES {
            return Err(AppError::BadRequest("Photo should be less than 1mb".into()));
        }
        if !photo
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
        {
            return Err(AppError::BadRequest("Photo must be an image".into()));
        }
    }

    let category_id: Uuid = category
        .parse()
        .map_err(|_| AppError::BadRequest("Category is invalid".into()))?;
    if state.store.find_category_by_id(category_id).await?.is_none() {
        return Err(AppError::BadRequest("Category does not exist".into()));
    }

    Ok(ValidForm {
        draft: ProductDraft {
            slug: slug_for(&name),
            name,
            description,
            price,
            category_id,
            quantity,
            shipping,
        },
        photo: form.photo.map(photo_blob),
    })
}

fn photo_blob(upload: PhotoUpload) -> PhotoBlob {
    PhotoBlob {
        data: upload.data,
        content_type: upload
            .content_type
            .unwrap_or_else(|| "application/octet-stream".into()),
    }
}

pub async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    form: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    let ValidForm { draft, photo } = validate_form(state, form).await?;
    let product = state.store.insert_product(draft, photo).await?;

    log_audit(
        state,
        Some(admin.0.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

/// Full replacement of the product fields; the photo is kept unless a new
/// one is uploaded.
pub async fn update_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    form: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    let ValidForm { draft, photo } = validate_form(state, form).await?;
    let product = state
        .store
        .update_product(id, draft, photo)
        .await?
        .ok_or(AppError::NotFound)?;

    log_audit(
        state,
        Some(admin.0.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !state.store.delete_product(id).await? {
        return Err(AppError::NotFound);
    }

    log_audit(
        state,
        Some(admin.0.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Newest products first; `q`, price bounds and sort are optional refinements.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let pagination = query.pagination();
    let (page, per_page) = pagination.normalize(LATEST_LIMIT);
    let filter = ProductFilter {
        keyword: query.q.clone(),
        min_price: query.min_price,
        max_price: query.max_price,
        ..Default::default()
    };
    let (items, total) = state
        .store
        .find_products(&filter, pagination.to_request(LATEST_LIMIT), query.sort())
        .await?;

    Ok(ApiResponse::success(
        "All products",
        ProductList { items },
        Some(Meta::new(page, per_page, total as i64)),
    ))
}

pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let product = state
        .store
        .find_product_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Single product fetched", product, None))
}

pub async fn product_photo(state: &AppState, id: Uuid) -> AppResult<ProductPhoto> {
    state
        .store
        .find_product_photo(id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn filter_products(
    state: &AppState,
    payload: ProductFilterRequest,
) -> AppResult<ApiResponse<ProductList>> {
    let (min_price, max_price) = match payload.radio.as_slice() {
        [] => (None, None),
        [min, max] if min <= max => (Some(*min), Some(*max)),
        _ => {
            return Err(AppError::BadRequest(
                "Price range must be [min, max]".into(),
            ));
        }
    };
    let filter = ProductFilter {
        category_ids: payload.checked,
        min_price,
        max_price,
        ..Default::default()
    };
    let (items, total) = state
        .store
        .find_products(&filter, PageRequest::all(), ProductSort::default())
        .await?;

    Ok(ApiResponse::success(
        "Filtered products",
        ProductList { items },
        Some(Meta::new(1, total as i64, total as i64)),
    ))
}

pub async fn product_count(state: &AppState) -> AppResult<ApiResponse<ProductCount>> {
    let (_, total) = state
        .store
        .find_products(
            &ProductFilter::default(),
            PageRequest::first(0),
            ProductSort::default(),
        )
        .await?;
    Ok(ApiResponse::success(
        "Product count",
        ProductCount { total },
        None,
    ))
}

pub async fn product_page(state: &AppState, page: u64) -> AppResult<ApiResponse<ProductList>> {
    let page = page.max(1);
    let (items, total) = state
        .store
        .find_products(
            &ProductFilter::default(),
            PageRequest::page(page, PAGE_SIZE),
            ProductSort::default(),
        )
        .await?;

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page as i64, PAGE_SIZE as i64, total as i64)),
    ))
}

pub async fn search_products(
    state: &AppState,
    keyword: &str,
) -> AppResult<ApiResponse<ProductList>> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::BadRequest("Keyword is required".into()));
    }
    let filter = ProductFilter {
        keyword: Some(keyword.to_string()),
        ..Default::default()
    };
    let (items, total) = state
        .store
        .find_products(&filter, PageRequest::all(), ProductSort::default())
        .await?;

    Ok(ApiResponse::success(
        "Search results",
        ProductList { items },
        Some(Meta::new(1, total as i64, total as i64)),
    ))
}

/// Up to three other products from the same category.
pub async fn related_products(
    state: &AppState,
    product_id: Uuid,
    category_id: Uuid,
) -> AppResult<ApiResponse<ProductList>> {
    let filter = ProductFilter {
        category_ids: vec![category_id],
        exclude_id: Some(product_id),
        ..Default::default()
    };
    let (items, _) = state
        .store
        .find_products(
            &filter,
            PageRequest::first(RELATED_LIMIT),
            ProductSort::default(),
        )
        .await?;

    Ok(ApiResponse::success(
        "Related products",
        ProductList { items },
        None,
    ))
}

pub async fn products_by_category(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<CategoryProducts>> {
    let category = state
        .store
        .find_category_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)?;
    let filter = ProductFilter {
        category_ids: vec![category.id],
        ..Default::default()
    };
    let (items, total) = state
        .store
        .find_products(&filter, PageRequest::all(), ProductSort::default())
        .await?;

    Ok(ApiResponse::success(
        "Category products",
        CategoryProducts { category, items },
        Some(Meta::new(1, total as i64, total as i64)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_accepts_common_spellings() {
        assert!(!parse_shipping(None).unwrap());
        assert!(!parse_shipping(Some("0")).unwrap());
        assert!(parse_shipping(Some("1")).unwrap());
        assert!(parse_shipping(Some("Yes")).unwrap());
        assert!(parse_shipping(Some("maybe")).is_err());
    }

    #[test]
    fn numbers_must_be_whole() {
        assert_eq!(parse_number::<i64>(" 1999 ", "Price").unwrap(), 1999);
        assert!(parse_number::<i64>("19.99", "Price").is_err());
        assert!(parse_number::<i32>("", "Quantity").is_err());
    }
}
