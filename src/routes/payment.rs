use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::orders::{CheckoutRequest, ClientTokenResponse, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

/// Gateway routes live under `/product/braintree`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/braintree/token", get(client_token))
        .route("/braintree/payment", post(checkout))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/braintree/token",
    responses(
        (status = 200, description = "Client token for the payment SDK", body = ApiResponse<ClientTokenResponse>),
        (status = 502, description = "Payment provider error")
    ),
    tag = "Payment"
)]
pub async fn client_token(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ClientTokenResponse>>> {
    let resp = payment_service::client_token(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/product/braintree/payment",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Charged and recorded the order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid cart or nonce"),
        (status = 401, description = "Missing or invalid token"),
        (status = 402, description = "Payment declined"),
        (status = 502, description = "Payment provider error")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = payment_service::checkout(&state, &user, payload).await?;
    Ok(Json(resp))
}
