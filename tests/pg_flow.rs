mod common;

use std::sync::Arc;

use common::{FakeGateway, SECRET};
use storefront_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    dto::orders::{CartLine, CheckoutRequest},
    middleware::auth::AuthUser,
    error::AppError,
    models::{NewAccount, OrderStatus, PhotoBlob, ProductDraft, Role, slug_for},
    security::{password, token::TokenService},
    services::payment_service,
    state::AppState,
    store::{PageRequest, PgStore, ProductFilter, ProductSort, Store},
};
use uuid::Uuid;

// Checkout against a real database: order and items persist together.
#[tokio::test]
async fn checkout_persists_order_in_postgres() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the Postgres flow."
            );
            return Ok(());
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let store = Arc::new(PgStore::new(pool.clone(), orm_from_pool(&pool)));
    let gateway = Arc::new(FakeGateway::approving("PG-T1"));
    let state = AppState::new(store.clone(), TokenService::new(SECRET), gateway.clone());

    let suffix = Uuid::new_v4().simple().to_string();
    let buyer = store
        .insert_account(NewAccount {
            name: "Pg Buyer".into(),
            email: format!("buyer-{suffix}@example.com"),
            password_hash: password::hash("secret1")?,
            phone: "555-0199".into(),
            address: "9 Db Road".into(),
            security_answer_hash: password::hash("blue")?,
            role: Role::Standard,
        })
        .await?;

    let taken = store
        .insert_account(NewAccount {
            name: "Pg Twin".into(),
            email: buyer.email.clone(),
            password_hash: buyer.password_hash.clone(),
            phone: buyer.phone.clone(),
            address: buyer.address.clone(),
            security_answer_hash: buyer.security_answer_hash.clone(),
            role: Role::Standard,
        })
        .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    let category_name = format!("Pg Category {suffix}");
    let category = store
        .insert_category(category_name.clone(), slug_for(&category_name))
        .await?;
    let product_name = format!("Pg Widget {suffix}");
    let product = store
        .insert_product(
            ProductDraft {
                name: product_name.clone(),
                slug: slug_for(&product_name),
                description: "100% real_widget".into(),
                price: 1000,
                category_id: category.id,
                quantity: 3,
                shipping: false,
            },
            None,
        )
        .await?;

    let filter = ProductFilter {
        keyword: Some("100% REAL_".into()),
        category_ids: vec![category.id],
        ..Default::default()
    };
    let (found, total) = store
        .find_products(&filter, PageRequest::all(), ProductSort::default())
        .await?;
    assert_eq!(total, 1);
    assert_eq!(found[0].id, product.id);
    assert_eq!(
        found[0].category.as_ref().map(|c| c.name.as_str()),
        Some(category_name.as_str())
    );

    let dup = store
        .insert_category(category_name.clone(), slug_for(&category_name))
        .await;
    assert!(matches!(dup, Err(AppError::Conflict(_))));

    let orphan_name = format!("Pg Orphan {suffix}");
    let orphan = store
        .insert_product(
            ProductDraft {
                name: orphan_name.clone(),
                slug: slug_for(&orphan_name),
                description: "no category".into(),
                price: 10,
                category_id: Uuid::new_v4(),
                quantity: 1,
                shipping: false,
            },
            Some(PhotoBlob {
                data: vec![1, 2, 3],
                content_type: "image/png".into(),
            }),
        )
        .await;
    assert!(orphan.is_err());
    assert!(store.find_product_by_slug(&slug_for(&orphan_name)).await?.is_none());

    let user = AuthUser {
        user_id: buyer.id,
        role: buyer.role,
    };
    let placed = payment_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            cart: vec![
                CartLine {
                    product_id: product.id,
                    price: 1000,
                },
                CartLine {
                    product_id: Uuid::new_v4(),
                    price: 2500,
                },
            ],
            nonce: Some("fake-valid-nonce".into()),
        },
    )
    .await?
    .data
    .expect("order");

    let orders = store.find_orders_by_buyer(buyer.id).await?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.id, placed.order.id);
    assert_eq!(orders[0].order.status, OrderStatus::NotProcessed);
    assert_eq!(orders[0].order.payment.transaction_id, "PG-T1");
    assert_eq!(orders[0].items.len(), 2);
    assert_eq!(orders[0].items[1].price, 2500);
    assert_eq!(
        orders[0].items[0].product.as_ref().map(|p| p.id),
        Some(product.id)
    );
    assert!(orders[0].items[1].product.is_none());
    assert_eq!(orders[0].buyer_name.as_deref(), Some("Pg Buyer"));
    assert_eq!(gateway.charged(), vec![3500]);

    Ok(())
}
