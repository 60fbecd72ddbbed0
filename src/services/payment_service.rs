//! Checkout: charge the cart total, then persist the order. An order exists
//! only for a sale the gateway accepted.

use crate::{
    audit::log_audit,
    dto::orders::{CartLine, CheckoutRequest, ClientTokenResponse, OrderWithItems},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{NewOrder, NewOrderItem},
    payment::{GatewayError, SaleOptions},
    response::{ApiResponse, Meta},
    services::optional,
    state::AppState,
};

pub async fn client_token(state: &AppState) -> AppResult<ApiResponse<ClientTokenResponse>> {
    let client_token = state.gateway.generate_client_token().await?;
    Ok(ApiResponse::success(
        "Client token",
        ClientTokenResponse { client_token },
        None,
    ))
}

/// Sum of the cart prices in minor units.
pub fn cart_total(cart: &[CartLine]) -> AppResult<i64> {
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    cart.iter().try_fold(0i64, |acc, line| {
        if line.price < 0 {
            return Err(AppError::BadRequest("Cart prices must not be negative".into()));
        }
        acc.checked_add(line.price)
            .ok_or_else(|| AppError::BadRequest("Cart total is too large".into()))
    })
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let nonce = optional(payload.nonce)
        .ok_or_else(|| AppError::BadRequest("Payment nonce is required".into()))?;
    let total = cart_total(&payload.cart)?;
    if total == 0 {
        return Err(AppError::BadRequest("Cart total must be greater than zero".into()));
    }

    let payment = match state
        .gateway
        .sale(total, &nonce, SaleOptions::default())
        .await
    {
        Ok(payment) => payment,
        Err(err) => {
            match &err {
                GatewayError::Declined(reason) => {
                    tracing::warn!(
                        user_id = %user.user_id,
                        amount = total,
                        reason = %reason,
                        "payment declined"
                    );
                }
                other => {
                    tracing::error!(
                        user_id = %user.user_id,
                        amount = total,
                        error = ?other,
                        "payment gateway failed"
                    );
                }
            }
            return Err(err.into());
        }
    };

    let items = payload
        .cart
        .iter()
        .map(|line| NewOrderItem {
            product_id: line.product_id,
            price: line.price,
        })
        .collect();
    let transaction_id = payment.transaction_id.clone();

    let record = match state
        .store
        .insert_order(NewOrder {
            buyer_id: user.user_id,
            items,
            payment,
        })
        .await
    {
        Ok(record) => record,
        Err(err) => {
            tracing::error!(
                user_id = %user.user_id,
                transaction_id = %transaction_id,
                error = ?err,
                "order write failed after charge, voiding"
            );
            if let Err(void_err) = state.gateway.void(&transaction_id).await {
                tracing::error!(
                    transaction_id = %transaction_id,
                    error = ?void_err,
                    "void failed, charge needs manual reconciliation"
                );
            }
            return Err(err);
        }
    };

    log_audit(
        state,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": record.order.id,
            "transaction_id": transaction_id,
            "amount": total,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment successful",
        OrderWithItems::from(record),
        Some(Meta::empty()),
    ))
}
