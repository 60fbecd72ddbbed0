mod common;

use common::{FakeGateway, auth, test_app};
use storefront_api::{
    dto::orders::{CartLine, CheckoutRequest},
    error::AppError,
    models::{OrderStatus, Role},
    payment::GatewayError,
    services::payment_service::checkout,
    store::Store,
};
use uuid::Uuid;

fn cart(prices: &[i64]) -> Vec<CartLine> {
    prices
        .iter()
        .map(|&price| CartLine {
            product_id: Uuid::new_v4(),
            price,
        })
        .collect()
}

fn request(prices: &[i64]) -> CheckoutRequest {
    CheckoutRequest {
        cart: cart(prices),
        nonce: Some("fake-valid-nonce".to_string()),
    }
}

#[tokio::test]
async fn approved_sale_records_exactly_one_order() {
    let app = test_app(FakeGateway::approving("T1"));
    let buyer = app.account("buyer@example.com", Role::Standard).await;

    let resp = checkout(&app.state, &auth(&buyer), request(&[10, 25]))
        .await
        .expect("checkout succeeds");
    let placed = resp.data.expect("order");

    assert_eq!(app.gateway.charged(), vec![35]);
    assert_eq!(placed.order.payment.transaction_id, "T1");
    assert_eq!(placed.order.status, OrderStatus::NotProcessed);
    assert_eq!(placed.items.len(), 2);
    assert_eq!(placed.items[0].price, 10);
    assert_eq!(placed.items[1].position, 1);

    let orders = app.store.find_orders_by_buyer(buyer.id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.id, placed.order.id);
    assert!(app.store.audit_actions().await.contains(&"checkout"));
}

#[tokio::test]
async fn declined_sale_records_no_order() {
    let app = test_app(FakeGateway::declining("Insufficient funds"));
    let buyer = app.account("buyer@example.com", Role::Standard).await;

    let err = checkout(&app.state, &auth(&buyer), request(&[10, 25]))
        .await
        .expect_err("decline fails checkout");

    assert!(matches!(err, AppError::Payment(GatewayError::Declined(_))));
    assert_eq!(err.status().as_u16(), 402);
    assert_eq!(app.gateway.charged(), vec![35]);
    assert_eq!(app.store.order_count().await, 0);
    assert!(app.gateway.voided().is_empty());
}

#[tokio::test]
async fn failed_order_write_voids_the_charge() {
    let app = test_app(FakeGateway::approving("T9"));
    // No stored account for this buyer, so the order insert is refused.
    let ghost = storefront_api::middleware::auth::AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Standard,
    };

    let err = checkout(&app.state, &ghost, request(&[500]))
        .await
        .expect_err("write failure surfaces");

    assert_eq!(err.status().as_u16(), 500);
    assert_eq!(app.gateway.voided(), vec!["T9".to_string()]);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn invalid_carts_never_reach_the_gateway() {
    let app = test_app(FakeGateway::approving("T1"));
    let buyer = app.account("buyer@example.com", Role::Standard).await;
    let user = auth(&buyer);

    let empty = checkout(&app.state, &user, request(&[])).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let negative = checkout(&app.state, &user, request(&[10, -5])).await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))));

    let free = checkout(&app.state, &user, request(&[0, 0])).await;
    assert!(matches!(free, Err(AppError::BadRequest(_))));

    let no_nonce = CheckoutRequest {
        cart: cart(&[10]),
        nonce: Some("  ".to_string()),
    };
    let no_nonce = checkout(&app.state, &user, no_nonce).await;
    assert!(matches!(no_nonce, Err(AppError::BadRequest(_))));

    assert!(app.gateway.charged().is_empty());
    assert_eq!(app.store.order_count().await, 0);
}
