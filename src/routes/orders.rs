use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::{AdminUser, AuthUser},
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

/// Order routes live under `/auth` alongside the account endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/all-orders", get(list_all_orders))
        .route("/order-status/{order_id}", put(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/all-orders",
    responses(
        (status = 200, description = "Every order, newest first", body = ApiResponse<OrderList>),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/order-status/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = ApiResponse<Order>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &admin, order_id, payload).await?;
    Ok(Json(resp))
}
