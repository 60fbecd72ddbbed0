mod common;

use common::{FakeGateway, admin, test_app};
use storefront_api::{
    dto::{
        categories::CategoryRequest,
        orders::UpdateOrderStatusRequest,
        products::{PhotoUpload, ProductFilterRequest, ProductForm},
    },
    error::AppError,
    models::{
        NewOrder, NewOrderItem, OrderStatus, PaymentRecord, PhotoBlob, ProductDraft, Role,
    },
    routes::params::ProductQuery,
    services::{category_service, order_service, product_service},
    store::{PageRequest, Store},
};
use uuid::Uuid;

fn form(name: &str, price: &str, category: Uuid) -> ProductForm {
    ProductForm {
        name: Some(name.into()),
        description: Some(format!("All about {name}")),
        price: Some(price.into()),
        category: Some(category.to_string()),
        quantity: Some("4".into()),
        shipping: Some("1".into()),
        photo: None,
    }
}

#[tokio::test]
async fn category_lifecycle() {
    let app = test_app(FakeGateway::approving("T1"));
    let boss = admin(&app.account("boss@example.com", Role::Admin).await);

    let created = category_service::create_category(
        &app.state,
        &boss,
        CategoryRequest {
            name: Some("Kids Collection".into()),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(created.slug, "kids-collection");

    let dup = category_service::create_category(
        &app.state,
        &boss,
        CategoryRequest {
            name: Some("Kids Collection".into()),
        },
    )
    .await;
    assert!(matches!(dup, Err(AppError::Conflict(_))));

    let renamed = category_service::update_category(
        &app.state,
        &boss,
        created.id,
        CategoryRequest {
            name: Some("Toys".into()),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(renamed.slug, "toys");

    let found = category_service::get_category_by_slug(&app.state, "toys").await.unwrap();
    assert_eq!(found.data.unwrap().id, created.id);

    app.product("Yo-yo", 300, created.id).await;
    let in_use = category_service::delete_category(&app.state, &boss, created.id).await;
    assert!(matches!(in_use, Err(AppError::BadRequest(_))));

    let empty = app.category("Empty").await;
    category_service::delete_category(&app.state, &boss, empty.id).await.unwrap();
    let gone = category_service::get_category_by_id(&app.state, empty.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));
}

#[tokio::test]
async fn product_form_is_validated() {
    let app = test_app(FakeGateway::approving("T1"));
    let boss = admin(&app.account("boss@example.com", Role::Admin).await);
    let category = app.category("Mugs").await;

    let mut missing = form("Ferris Mug", "1200", category.id);
    missing.description = None;
    let err = product_service::create_product(&app.state, &boss, missing).await;
    assert!(matches!(err, Err(AppError::BadRequest(msg)) if msg == "Description is required"));

    let unknown_category = product_service::create_product(
        &app.state,
        &boss,
        form("Ferris Mug", "1200", Uuid::new_v4()),
    )
    .await;
    assert!(matches!(unknown_category, Err(AppError::BadRequest(_))));

    let mut huge = form("Ferris Mug", "1200", category.id);
    huge.photo = Some(PhotoUpload {
        data: vec![0; product_service::MAX_PHOTO_BYTES + 1],
        content_type: Some("image/png".into()),
    });
    let err = product_service::create_product(&app.state, &boss, huge).await;
    assert!(matches!(err, Err(AppError::BadRequest(_))));

    let (items, _) = app
        .store
        .find_products(&Default::default(), PageRequest::all(), Default::default())
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn product_with_photo_round_trips_through_the_store() {
    let app = test_app(FakeGateway::approving("T1"));
    let boss = admin(&app.account("boss@example.com", Role::Admin).await);
    let category = app.category("Mugs").await;

    let mut with_photo = form("Ferris Mug", "1200", category.id);
    with_photo.photo = Some(PhotoUpload {
        data: vec![1, 2, 3],
        content_type: Some("image/png".into()),
    });
    let product = product_service::create_product(&app.state, &boss, with_photo)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(product.slug, "ferris-mug");
    assert!(product.has_photo);
    assert!(product.shipping);

    let photo = product_service::product_photo(&app.state, product.id).await.unwrap();
    assert_eq!(photo.data, vec![1, 2, 3]);
    assert_eq!(photo.content_type, "image/png");

    let updated = product_service::update_product(
        &app.state,
        &boss,
        product.id,
        form("Ferris Mug XL", "1500", category.id),
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(updated.slug, "ferris-mug-xl");
    assert!(updated.has_photo);

    product_service::delete_product(&app.state, &boss, product.id).await.unwrap();
    let gone = product_service::product_photo(&app.state, product.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));
}

#[tokio::test]
async fn browsing_filters_search_and_related() {
    let app = test_app(FakeGateway::approving("T1"));
    let mugs = app.category("Mugs").await;
    let shirts = app.category("Shirts").await;
    let mug = app.product("Ferris Mug", 1200, mugs.id).await;
    app.product("Crab Mug", 900, mugs.id).await;
    app.product("Tall Mug", 2000, mugs.id).await;
    app.product("Big Mug", 2500, mugs.id).await;
    app.product("Rust Tee", 1500, shirts.id).await;

    let count = product_service::product_count(&app.state).await.unwrap();
    assert_eq!(count.data.unwrap().total, 5);

    let page_one = product_service::product_page(&app.state, 1).await.unwrap();
    assert_eq!(page_one.data.unwrap().items.len(), 5);
    let page_two = product_service::product_page(&app.state, 2).await.unwrap();
    assert!(page_two.data.unwrap().items.is_empty());

    let filtered = product_service::filter_products(
        &app.state,
        ProductFilterRequest {
            checked: vec![mugs.id],
            radio: vec![1000, 2000],
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    let mut names: Vec<_> = filtered.items.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Ferris Mug", "Tall Mug"]);

    let bad_range = product_service::filter_products(
        &app.state,
        ProductFilterRequest {
            checked: vec![],
            radio: vec![5],
        },
    )
    .await;
    assert!(matches!(bad_range, Err(AppError::BadRequest(_))));

    let found = product_service::search_products(&app.state, "FERRIS").await.unwrap();
    assert_eq!(found.data.unwrap().items.len(), 1);

    let related = product_service::related_products(&app.state, mug.id, mugs.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(related.items.len(), 3);
    assert!(related.items.iter().all(|p| p.id != mug.id && p.category_id == mugs.id));

    let by_category = product_service::products_by_category(&app.state, "shirts")
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(by_category.category.id, shirts.id);
    assert_eq!(by_category.items.len(), 1);

    let latest = product_service::list_products(&app.state, ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(latest.meta.unwrap().total, Some(5));
}

#[tokio::test]
async fn admin_moves_orders_through_statuses() {
    let app = test_app(FakeGateway::approving("T1"));
    let boss = admin(&app.account("boss@example.com", Role::Admin).await);
    let buyer = app.account("buyer@example.com", Role::Standard).await;
    let record = app
        .store
        .insert_order(NewOrder {
            buyer_id: buyer.id,
            items: vec![NewOrderItem {
                product_id: Uuid::new_v4(),
                price: 700,
            }],
            payment: PaymentRecord {
                transaction_id: "T1".into(),
                status: "SETTLED".into(),
                amount: 700,
                raw: serde_json::json!({}),
            },
        })
        .await
        .unwrap();

    let updated = order_service::update_order_status(
        &app.state,
        &boss,
        record.order.id,
        UpdateOrderStatusRequest {
            status: Some("shipped".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.data.unwrap().status, OrderStatus::Shipped);

    let bogus = order_service::update_order_status(
        &app.state,
        &boss,
        record.order.id,
        UpdateOrderStatusRequest {
            status: Some("lost".into()),
        },
    )
    .await;
    assert!(matches!(bogus, Err(AppError::BadRequest(_))));

    let missing = order_service::update_order_status(
        &app.state,
        &boss,
        Uuid::new_v4(),
        UpdateOrderStatusRequest {
            status: Some("delivered".into()),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let own = order_service::list_orders(&app.state, &common::auth(&buyer)).await.unwrap();
    let own = own.data.unwrap();
    assert_eq!(own.items.len(), 1);
    assert_eq!(own.items[0].buyer_name.as_deref(), Some("Test User"));
    assert_eq!(own.items[0].items[0].position, 0);
    assert!(own.items[0].items[0].product.is_none());

    let all = order_service::list_all_orders(&app.state, &boss).await.unwrap();
    assert_eq!(all.data.unwrap().items.len(), 1);
}

#[tokio::test]
async fn product_reads_carry_their_category() {
    let app = test_app(FakeGateway::approving("T1"));
    let boss = admin(&app.account("boss@example.com", Role::Admin).await);
    let mugs = app.category("Mugs").await;
    let mug = app.product("Ferris Mug", 1200, mugs.id).await;
    app.product("Crab Mug", 900, mugs.id).await;

    assert_eq!(mug.category.as_ref().map(|c| c.name.as_str()), Some("Mugs"));

    category_service::update_category(
        &app.state,
        &boss,
        mugs.id,
        CategoryRequest {
            name: Some("Cups".into()),
        },
    )
    .await
    .unwrap();

    let single = product_service::get_product(&app.state, "ferris-mug")
        .await
        .unwrap()
        .data
        .unwrap();
    let summary = single.category.unwrap();
    assert_eq!(summary.id, mugs.id);
    assert_eq!(summary.name, "Cups");
    assert_eq!(summary.slug, "cups");

    let latest = product_service::list_products(&app.state, ProductQuery::default())
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(latest
        .items
        .iter()
        .all(|p| p.category.as_ref().is_some_and(|c| c.name == "Cups")));

    let related = product_service::related_products(&app.state, mug.id, mugs.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(related.items.len(), 1);
    assert_eq!(related.items[0].category.as_ref().unwrap().slug, "cups");

    let by_category = product_service::products_by_category(&app.state, "cups")
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(by_category.items.iter().all(|p| p.category.is_some()));
}

#[tokio::test]
async fn order_items_summarise_products_until_they_are_deleted() {
    let app = test_app(FakeGateway::approving("T1"));
    let boss = admin(&app.account("boss@example.com", Role::Admin).await);
    let buyer = app.account("buyer@example.com", Role::Standard).await;
    let mugs = app.category("Mugs").await;
    let mug = app.product("Ferris Mug", 1200, mugs.id).await;
    let tee = app.product("Crab Tee", 800, mugs.id).await;

    app.store
        .insert_order(NewOrder {
            buyer_id: buyer.id,
            items: vec![
                NewOrderItem {
                    product_id: mug.id,
                    price: 1200,
                },
                NewOrderItem {
                    product_id: tee.id,
                    price: 800,
                },
            ],
            payment: PaymentRecord {
                transaction_id: "T1".into(),
                status: "SETTLED".into(),
                amount: 2000,
                raw: serde_json::json!({}),
            },
        })
        .await
        .unwrap();

    let own = order_service::list_orders(&app.state, &common::auth(&buyer))
        .await
        .unwrap()
        .data
        .unwrap();
    let items = &own.items[0].items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].position, 0);
    assert_eq!(items[1].position, 1);
    let first = items[0].product.as_ref().unwrap();
    assert_eq!(first.id, mug.id);
    assert_eq!(first.name, "Ferris Mug");
    assert_eq!(first.price, 1200);
    assert_eq!(items[1].product.as_ref().unwrap().name, "Crab Tee");

    product_service::delete_product(&app.state, &boss, mug.id).await.unwrap();

    let all = order_service::list_all_orders(&app.state, &boss)
        .await
        .unwrap()
        .data
        .unwrap();
    let items = &all.items[0].items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product_id, mug.id);
    assert_eq!(items[0].price, 1200);
    assert!(items[0].product.is_none());
    assert_eq!(items[1].product.as_ref().unwrap().id, tee.id);
}

#[tokio::test]
async fn failed_product_insert_leaves_no_photo_behind() {
    let app = test_app(FakeGateway::approving("T1"));
    app.category("Mugs").await;

    let draft = ProductDraft {
        name: "Ghost Mug".into(),
        slug: "ghost-mug".into(),
        description: "Never stored".into(),
        price: 100,
        category_id: Uuid::new_v4(),
        quantity: 1,
        shipping: false,
    };
    let photo = PhotoBlob {
        data: vec![9, 9, 9],
        content_type: "image/jpeg".into(),
    };
    assert!(app.store.insert_product(draft, Some(photo)).await.is_err());

    let (items, total) = app
        .store
        .find_products(&Default::default(), PageRequest::all(), Default::default())
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn product_slug_lookup_returns_the_newest_match() {
    let app = test_app(FakeGateway::approving("T1"));
    let mugs = app.category("Mugs").await;
    app.product("Ferris Mug", 1200, mugs.id).await;
    let newer = app.product("Ferris Mug", 1500, mugs.id).await;

    let found = product_service::get_product(&app.state, "ferris-mug")
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(found.id, newer.id);
    assert_eq!(found.price, 1500);
}

#[tokio::test]
async fn far_pages_are_empty_not_errors() {
    let app = test_app(FakeGateway::approving("T1"));
    let mugs = app.category("Mugs").await;
    app.product("Ferris Mug", 1200, mugs.id).await;

    let listed = product_service::list_products(
        &app.state,
        ProductQuery {
            page: Some(i64::MAX),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(listed.data.unwrap().items.is_empty());
    assert_eq!(listed.meta.unwrap().total, Some(1));

    let paged = product_service::product_page(&app.state, u64::MAX).await.unwrap();
    assert!(paged.data.unwrap().items.is_empty());
}
