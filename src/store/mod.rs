//! Persistence capability for accounts, catalog, orders and audit entries.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Account, AuditEntry, Category, NewAccount, NewOrder, Order, OrderItem, OrderStatus,
        PhotoBlob, Product, ProductDraft, ProductPhoto,
    },
    routes::params::SortOrder,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name or description.
    pub keyword: Option<String>,
    /// Empty means any category.
    pub category_ids: Vec<Uuid>,
    pub exclude_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// `None` returns every match.
    pub limit: Option<u64>,
    pub offset: u64,
}

impl PageRequest {
    pub fn first(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }

    pub fn all() -> Self {
        Self {
            limit: None,
            offset: 0,
        }
    }

    /// 1-based page of `per_page` items. The offset is capped at what a
    /// signed 64-bit SQL `OFFSET` accepts.
    pub fn page(page: u64, per_page: u64) -> Self {
        Self {
            limit: Some(per_page),
            offset: page
                .saturating_sub(1)
                .saturating_mul(per_page)
                .min(MAX_OFFSET),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortKey {
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy)]
pub struct ProductSort {
    pub key: ProductSortKey,
    pub order: SortOrder,
}

impl Default for ProductSort {
    fn default() -> Self {
        Self {
            key: ProductSortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// An order with its items in cart order and the buyer's display name.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub buyer_name: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>>;
    async fn find_account_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert_account(&self, account: NewAccount) -> AppResult<Account>;
    async fn update_account(&self, account: Account) -> AppResult<Account>;

    async fn find_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
        sort: ProductSort,
    ) -> AppResult<(Vec<Product>, u64)>;
    /// Slugs are not unique; the most recently created product wins.
    async fn find_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>>;
    async fn find_product_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;
    /// Writes the product and its optional photo as one unit.
    async fn insert_product(
        &self,
        draft: ProductDraft,
        photo: Option<PhotoBlob>,
    ) -> AppResult<Product>;
    /// Replaces the fields; the stored photo is kept unless `photo` is given.
    async fn update_product(
        &self,
        id: Uuid,
        draft: ProductDraft,
        photo: Option<PhotoBlob>,
    ) -> AppResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;
    async fn count_products_in_category(&self, category_id: Uuid) -> AppResult<u64>;
    async fn find_product_photo(&self, product_id: Uuid) -> AppResult<Option<ProductPhoto>>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;
    async fn find_category_by_id(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>>;
    /// Fails with `Conflict` when the name is taken, as does `update_category`.
    async fn insert_category(&self, name: String, slug: String) -> AppResult<Category>;
    async fn update_category(
        &self,
        id: Uuid,
        name: String,
        slug: String,
    ) -> AppResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> AppResult<bool>;

    /// Writes the order and all of its items as one unit.
    async fn insert_order(&self, order: NewOrder) -> AppResult<OrderRecord>;
    async fn find_orders_by_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<OrderRecord>>;
    async fn find_all_orders(&self) -> AppResult<Vec<OrderRecord>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus)
    -> AppResult<Option<Order>>;

    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()>;
}
