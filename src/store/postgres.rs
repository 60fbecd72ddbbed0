use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::{OrderRecord, PageRequest, ProductFilter, ProductSort, ProductSortKey, Store};
use crate::{
    db::{DbPool, OrmConn},
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        product_photos::{
            ActiveModel as PhotoActive, Column as PhotoCol, Entity as ProductPhotos,
        },
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{
        Account, AuditEntry, Category, CategorySummary, NewAccount, NewOrder, Order, OrderItem,
        OrderStatus, PhotoBlob, Product, ProductDraft, ProductPhoto, ProductSummary,
    },
    routes::params::SortOrder,
};

/// PostgreSQL store: SeaORM for entities, raw sqlx for the audit trail.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    orm: OrmConn,
}

impl PgStore {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}

/// Attaches items (with their products, when still present) and buyer names.
async fn load_order_records<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderRecord>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let buyer_ids: Vec<Uuid> = orders.iter().map(|o| o.buyer_id).collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for (item, product) in OrderItems::find()
        .find_also_related(Products)
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?
    {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item, product));
    }

    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(buyer_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    orders
        .into_iter()
        .map(|model| {
            let items = items_by_order.remove(&model.id).unwrap_or_default();
            let buyer_name = names.get(&model.buyer_id).cloned();
            Ok(OrderRecord {
                order: order_from_entity(model)?,
                items,
                buyer_name,
            })
        })
        .collect()
}

const EMAIL_TAKEN: &str = "Email is already registered";
const CATEGORY_TAKEN: &str = "Category already exists";

/// Maps a unique index violation to `Conflict`; anything else stays a storage error.
fn unique_violation(message: &'static str) -> impl FnOnce(DbErr) -> AppError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
        _ => AppError::OrmError(err),
    }
}

fn product_condition(filter: &ProductFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(keyword) = filter.keyword.as_ref().filter(|k| !k.is_empty()) {
        let pattern = like_pattern(keyword);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, ProdCol::Name)).ilike(pattern.clone()))
                .add(Expr::col((Products, ProdCol::Description)).ilike(pattern)),
        );
    }
    if !filter.category_ids.is_empty() {
        condition = condition.add(ProdCol::CategoryId.is_in(filter.category_ids.clone()));
    }
    if let Some(exclude) = filter.exclude_id {
        condition = condition.add(ProdCol::Id.ne(exclude));
    }
    if let Some(min_price) = filter.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }
    condition
}

fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl Store for PgStore {
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&self.orm)
            .await?
            .map(account_from_entity)
            .transpose()
    }

    async fn find_account_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Users::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(account_from_entity)
            .transpose()
    }

    async fn insert_account(&self, account: NewAccount) -> AppResult<Account> {
        let model = UserActive {
            id: Set(Uuid::new_v4()),
            name: Set(account.name),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            phone: Set(account.phone),
            address: Set(account.address),
            security_answer_hash: Set(account.security_answer_hash),
            role: Set(account.role.as_str().to_string()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.orm)
        .await
        .map_err(unique_violation(EMAIL_TAKEN))?;
        account_from_entity(model)
    }

    async fn update_account(&self, account: Account) -> AppResult<Account> {
        let model = UserActive {
            id: Set(account.id),
            name: Set(account.name),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            phone: Set(account.phone),
            address: Set(account.address),
            security_answer_hash: Set(account.security_answer_hash),
            role: Set(account.role.as_str().to_string()),
            created_at: NotSet,
            updated_at: Set(Utc::now().into()),
        }
        .update(&self.orm)
        .await
        .map_err(unique_violation(EMAIL_TAKEN))?;
        account_from_entity(model)
    }

    async fn find_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
        sort: ProductSort,
    ) -> AppResult<(Vec<Product>, u64)> {
        let condition = product_condition(filter);
        let total = Products::find()
            .filter(condition.clone())
            .count(&self.orm)
            .await?;

        let sort_col = match sort.key {
            ProductSortKey::CreatedAt => ProdCol::CreatedAt,
            ProductSortKey::Price => ProdCol::Price,
            ProductSortKey::Name => ProdCol::Name,
        };
        let mut finder = Products::find()
            .find_also_related(Categories)
            .filter(condition);
        finder = match sort.order {
            SortOrder::Asc => finder.order_by_asc(sort_col),
            SortOrder::Desc => finder.order_by_desc(sort_col),
        };

        let mut finder = finder.offset(page.offset);
        if let Some(limit) = page.limit {
            finder = finder.limit(limit);
        }
        let items = finder
            .all(&self.orm)
            .await?
            .into_iter()
            .map(|(product, category)| product_from_entity(product, category))
            .collect();

        Ok((items, total))
    }

    async fn find_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        Ok(Products::find()
            .find_also_related(Categories)
            .filter(ProdCol::Slug.eq(slug))
            .order_by_desc(ProdCol::CreatedAt)
            .one(&self.orm)
            .await?
            .map(|(product, category)| product_from_entity(product, category)))
    }

    async fn find_product_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(Products::find_by_id(id)
            .find_also_related(Categories)
            .one(&self.orm)
            .await?
            .map(|(product, category)| product_from_entity(product, category)))
    }

    async fn insert_product(
        &self,
        draft: ProductDraft,
        photo: Option<PhotoBlob>,
    ) -> AppResult<Product> {
        let txn = self.orm.begin().await?;
        let model = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(draft.name),
            slug: Set(draft.slug),
            description: Set(draft.description),
            price: Set(draft.price),
            category_id: Set(draft.category_id),
            quantity: Set(draft.quantity),
            shipping: Set(draft.shipping),
            has_photo: Set(photo.is_some()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;
        if let Some(photo) = photo {
            upsert_photo(&txn, model.id, photo).await?;
        }
        let category = Categories::find_by_id(model.category_id).one(&txn).await?;
        txn.commit().await?;
        Ok(product_from_entity(model, category))
    }

    async fn update_product(
        &self,
        id: Uuid,
        draft: ProductDraft,
        photo: Option<PhotoBlob>,
    ) -> AppResult<Option<Product>> {
        let txn = self.orm.begin().await?;
        let Some(existing) = Products::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };
        let has_photo = existing.has_photo || photo.is_some();
        let mut active: ProductActive = existing.into();
        active.name = Set(draft.name);
        active.slug = Set(draft.slug);
        active.description = Set(draft.description);
        active.price = Set(draft.price);
        active.category_id = Set(draft.category_id);
        active.quantity = Set(draft.quantity);
        active.shipping = Set(draft.shipping);
        active.has_photo = Set(has_photo);
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await?;
        if let Some(photo) = photo {
            upsert_photo(&txn, id, photo).await?;
        }
        let category = Categories::find_by_id(model.category_id).one(&txn).await?;
        txn.commit().await?;
        Ok(Some(product_from_entity(model, category)))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn count_products_in_category(&self, category_id: Uuid) -> AppResult<u64> {
        Ok(Products::find()
            .filter(ProdCol::CategoryId.eq(category_id))
            .count(&self.orm)
            .await?)
    }

    async fn find_product_photo(&self, product_id: Uuid) -> AppResult<Option<ProductPhoto>> {
        Ok(ProductPhotos::find_by_id(product_id)
            .one(&self.orm)
            .await?
            .map(|m| ProductPhoto {
                product_id: m.product_id,
                data: m.data,
                content_type: m.content_type,
            }))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(Categories::find()
            .order_by_asc(CategoryCol::Name)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(category_from_entity)
            .collect())
    }

    async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        Ok(Categories::find()
            .filter(CategoryCol::Slug.eq(slug))
            .one(&self.orm)
            .await?
            .map(category_from_entity))
    }

    async fn find_category_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(Categories::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(category_from_entity))
    }

    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(Categories::find()
            .filter(CategoryCol::Name.eq(name))
            .one(&self.orm)
            .await?
            .map(category_from_entity))
    }

    async fn insert_category(&self, name: String, slug: String) -> AppResult<Category> {
        let model = CategoryActive {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            slug: Set(slug),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.orm)
        .await
        .map_err(unique_violation(CATEGORY_TAKEN))?;
        Ok(category_from_entity(model))
    }

    async fn update_category(
        &self,
        id: Uuid,
        name: String,
        slug: String,
    ) -> AppResult<Option<Category>> {
        let Some(existing) = Categories::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let mut active: CategoryActive = existing.into();
        active.name = Set(name);
        active.slug = Set(slug);
        active.updated_at = Set(Utc::now().into());
        let model = active
            .update(&self.orm)
            .await
            .map_err(unique_violation(CATEGORY_TAKEN))?;
        Ok(Some(category_from_entity(model)))
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        let result = Categories::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn insert_order(&self, order: NewOrder) -> AppResult<OrderRecord> {
        let payment = serde_json::to_value(&order.payment)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        let txn = self.orm.begin().await?;

        let model = OrderActive {
            id: Set(Uuid::new_v4()),
            buyer_id: Set(order.buyer_id),
            payment: Set(payment),
            status: Set(OrderStatus::NotProcessed.as_str().to_string()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        for (position, item) in order.items.into_iter().enumerate() {
            OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(model.id),
                position: Set(position as i32),
                product_id: Set(item.product_id),
                price: Set(item.price),
            }
            .insert(&txn)
            .await?;
        }

        let record = load_order_records(&txn, vec![model])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order vanished after insert")))?;

        txn.commit().await?;
        Ok(record)
    }

    async fn find_orders_by_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<OrderRecord>> {
        let orders = Orders::find()
            .filter(OrderCol::BuyerId.eq(buyer_id))
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.orm)
            .await?;
        load_order_records(&self.orm, orders).await
    }

    async fn find_all_orders(&self) -> AppResult<Vec<OrderRecord>> {
        let orders = Orders::find()
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.orm)
            .await?;
        load_order_records(&self.orm, orders).await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Option<Order>> {
        let Some(existing) = Orders::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let mut active: OrderActive = existing.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&self.orm).await?;
        order_from_entity(model).map(Some)
    }

    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, resource, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.resource)
        .bind(entry.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn account_from_entity(model: UserModel) -> AppResult<Account> {
    let role = model
        .role
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Account {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        phone: model.phone,
        address: model.address,
        security_answer_hash: model.security_answer_hash,
        role,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

async fn upsert_photo<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    photo: PhotoBlob,
) -> Result<(), DbErr> {
    ProductPhotos::insert(PhotoActive {
        product_id: Set(product_id),
        data: Set(photo.data),
        content_type: Set(photo.content_type),
    })
    .on_conflict(
        OnConflict::column(PhotoCol::ProductId)
            .update_columns([PhotoCol::Data, PhotoCol::ContentType])
            .to_owned(),
    )
    .exec(conn)
    .await?;
    Ok(())
}

fn product_from_entity(model: ProductModel, category: Option<CategoryModel>) -> Product {
    Product {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: model.price,
        category_id: model.category_id,
        quantity: model.quantity,
        shipping: model.shipping,
        has_photo: model.has_photo,
        category: category.map(|c| CategorySummary {
            id: c.id,
            name: c.name,
            slug: c.slug,
        }),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let payment = serde_json::from_value(model.payment)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt payment record: {e}")))?;
    let status = model
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Order {
        id: model.id,
        buyer_id: model.buyer_id,
        payment,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel, product: Option<ProductModel>) -> OrderItem {
    OrderItem {
        position: model.position,
        product_id: model.product_id,
        price: model.price,
        product: product.map(|p| ProductSummary {
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            price: p.price,
            category_id: p.category_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mug"), "%mug%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
