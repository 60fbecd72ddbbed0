use anyhow::Context;
use storefront_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    models::{NewAccount, ProductDraft, Role, slug_for},
    security::password,
    store::{PgStore, Store},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let store = PgStore::new(pool.clone(), orm_from_pool(&pool));

    let admin_id =
        ensure_account(&store, "Admin", "admin@example.com", "admin123", Role::Admin).await?;
    let user_id =
        ensure_account(&store, "Customer", "user@example.com", "user123", Role::Standard).await?;
    let category_id = ensure_category(&store, "Merchandise").await?;
    seed_products(&store, category_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_account(
    store: &PgStore,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(mut existing) = store.find_account_by_email(email).await? {
        existing.role = role;
        let account = store.update_account(existing).await?;
        println!("Ensured user {email} (role={role})");
        return Ok(account.id);
    }

    let account = store
        .insert_account(NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password::hash(password)?,
            phone: "000-000-0000".to_string(),
            address: "1 Seed Street".to_string(),
            security_answer_hash: password::hash("ferris")?,
            role,
        })
        .await?;
    println!("Created user {email} (role={role})");
    Ok(account.id)
}

async fn ensure_category(store: &PgStore, name: &str) -> anyhow::Result<Uuid> {
    if let Some(category) = store.find_category_by_name(name).await? {
        return Ok(category.id);
    }
    let category = store.insert_category(name.to_string(), slug_for(name)).await?;
    Ok(category.id)
}

async fn seed_products(store: &PgStore, category_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 5500, 50, true),
        ("Ferris Mug", "Coffee tastes better with Ferris", 1200, 100, true),
        ("Rust Sticker Pack", "Decorate your laptop", 500, 200, false),
        ("E-book: Async Rust", "Learn async Rust patterns", 2500, 75, false),
    ];

    for (name, desc, price, quantity, shipping) in products {
        let slug = slug_for(name);
        if store.find_product_by_slug(&slug).await?.is_some() {
            continue;
        }
        store
            .insert_product(
                ProductDraft {
                    name: name.to_string(),
                    slug,
                    description: desc.to_string(),
                    price,
                    category_id,
                    quantity,
                    shipping,
                },
                None,
            )
            .await?;
    }

    println!("Seeded products");
    Ok(())
}
