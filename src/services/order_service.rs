use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AdminUser, AuthUser},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    services::required,
    state::AppState,
};

fn order_list(records: Vec<crate::store::OrderRecord>) -> (OrderList, Meta) {
    let total = records.len() as i64;
    let items = records.into_iter().map(OrderWithItems::from).collect();
    (OrderList { items }, Meta::new(1, total, total))
}

/// The caller's own orders, newest first.
pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let records = state.store.find_orders_by_buyer(user.user_id).await?;
    let (list, meta) = order_list(records);
    Ok(ApiResponse::success("Orders", list, Some(meta)))
}

pub async fn list_all_orders(
    state: &AppState,
    _admin: &AdminUser,
) -> AppResult<ApiResponse<OrderList>> {
    let records = state.store.find_all_orders().await?;
    let (list, meta) = order_list(records);
    Ok(ApiResponse::success("All orders", list, Some(meta)))
}

pub async fn update_order_status(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status: OrderStatus = required(payload.status, "Status is required")?
        .parse()
        .map_err(AppError::BadRequest)?;

    let order = state
        .store
        .update_order_status(id, status)
        .await?
        .ok_or(AppError::NotFound)?;

    log_audit(
        state,
        Some(admin.0.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "status": status.as_str() })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        order,
        Some(Meta::empty()),
    ))
}
