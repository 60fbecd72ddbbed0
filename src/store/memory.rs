use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderRecord, PageRequest, ProductFilter, ProductSort, ProductSortKey, Store};
use crate::{
    error::{AppError, AppResult},
    models::{
        Account, AuditEntry, Category, CategorySummary, NewAccount, NewOrder, Order, OrderItem,
        OrderStatus, PhotoBlob, Product, ProductDraft, ProductPhoto, ProductSummary,
    },
    routes::params::SortOrder,
};

/// In-process store for tests and database-less local runs. Enforces the
/// same uniqueness and reference rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    categories: Vec<Category>,
    products: Vec<Product>,
    photos: HashMap<Uuid, ProductPhoto>,
    orders: Vec<OrderRecord>,
    audit: Vec<AuditEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    pub async fn audit_actions(&self) -> Vec<&'static str> {
        self.inner.read().await.audit.iter().map(|e| e.action).collect()
    }
}

fn constraint(message: impl Into<String>) -> AppError {
    AppError::Internal(anyhow::anyhow!(message.into()))
}

const EMAIL_TAKEN: &str = "Email is already registered";
const CATEGORY_TAKEN: &str = "Category already exists";

impl Tables {
    fn with_category(&self, mut product: Product) -> Product {
        product.category = self
            .categories
            .iter()
            .find(|c| c.id == product.category_id)
            .map(CategorySummary::from);
        product
    }

    fn with_products(&self, mut record: OrderRecord) -> OrderRecord {
        for item in &mut record.items {
            item.product = self
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(ProductSummary::from);
        }
        record
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(keyword) = filter.keyword.as_ref().filter(|k| !k.is_empty()) {
        let keyword = keyword.to_lowercase();
        if !product.name.to_lowercase().contains(&keyword)
            && !product.description.to_lowercase().contains(&keyword)
        {
            return false;
        }
    }
    if !filter.category_ids.is_empty() && !filter.category_ids.contains(&product.category_id) {
        return false;
    }
    if filter.exclude_id == Some(product.id) {
        return false;
    }
    if filter.min_price.is_some_and(|min| product.price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| product.price > max) {
        return false;
    }
    true
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let tables = self.inner.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn insert_account(&self, account: NewAccount) -> AppResult<Account> {
        let mut tables = self.inner.write().await;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            phone: account.phone,
            address: account.address,
            security_answer_hash: account.security_answer_hash,
            role: account.role,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(&self, mut account: Account) -> AppResult<Account> {
        let mut tables = self.inner.write().await;
        if tables
            .accounts
            .values()
            .any(|a| a.email == account.email && a.id != account.id)
        {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        if !tables.accounts.contains_key(&account.id) {
            return Err(AppError::NotFound);
        }
        account.updated_at = Utc::now();
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
        sort: ProductSort,
    ) -> AppResult<(Vec<Product>, u64)> {
        let tables = self.inner.read().await;
        let mut items: Vec<Product> = tables
            .products
            .iter()
            .filter(|p| matches_filter(p, filter))
            .map(|p| tables.with_category(p.clone()))
            .collect();
        items.sort_by(|a, b| {
            let ord = match sort.key {
                ProductSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                ProductSortKey::Price => a.price.cmp(&b.price),
                ProductSortKey::Name => a.name.cmp(&b.name),
            };
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit.map_or(usize::MAX, |l| l as usize))
            .collect();
        Ok((items, total))
    }

    async fn find_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        let tables = self.inner.read().await;
        Ok(tables
            .products
            .iter()
            .rev()
            .find(|p| p.slug == slug)
            .map(|p| tables.with_category(p.clone())))
    }

    async fn find_product_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let tables = self.inner.read().await;
        Ok(tables
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.with_category(p.clone())))
    }

    async fn insert_product(
        &self,
        draft: ProductDraft,
        photo: Option<PhotoBlob>,
    ) -> AppResult<Product> {
        let mut tables = self.inner.write().await;
        if !tables.categories.iter().any(|c| c.id == draft.category_id) {
            return Err(constraint(format!("unknown category {}", draft.category_id)));
        }
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: draft.name,
            slug: draft.slug,
            description: draft.description,
            price: draft.price,
            category_id: draft.category_id,
            quantity: draft.quantity,
            shipping: draft.shipping,
            has_photo: photo.is_some(),
            category: None,
            created_at: now,
            updated_at: now,
        };
        if let Some(photo) = photo {
            tables.photos.insert(
                product.id,
                ProductPhoto {
                    product_id: product.id,
                    data: photo.data,
                    content_type: photo.content_type,
                },
            );
        }
        tables.products.push(product.clone());
        Ok(tables.with_category(product))
    }

    async fn update_product(
        &self,
        id: Uuid,
        draft: ProductDraft,
        photo: Option<PhotoBlob>,
    ) -> AppResult<Option<Product>> {
        let mut tables = self.inner.write().await;
        if !tables.categories.iter().any(|c| c.id == draft.category_id) {
            return Err(constraint(format!("unknown category {}", draft.category_id)));
        }
        let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        product.name = draft.name;
        product.slug = draft.slug;
        product.description = draft.description;
        product.price = draft.price;
        product.category_id = draft.category_id;
        product.quantity = draft.quantity;
        product.shipping = draft.shipping;
        product.has_photo |= photo.is_some();
        product.updated_at = Utc::now();
        let product = product.clone();
        if let Some(photo) = photo {
            tables.photos.insert(
                id,
                ProductPhoto {
                    product_id: id,
                    data: photo.data,
                    content_type: photo.content_type,
                },
            );
        }
        Ok(Some(tables.with_category(product)))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        tables.photos.remove(&id);
        Ok(tables.products.len() != before)
    }

    async fn count_products_in_category(&self, category_id: Uuid) -> AppResult<u64> {
        let tables = self.inner.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| p.category_id == category_id)
            .count() as u64)
    }

    async fn find_product_photo(&self, product_id: Uuid) -> AppResult<Option<ProductPhoto>> {
        Ok(self.inner.read().await.photos.get(&product_id).cloned())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.inner.read().await.categories.clone())
    }

    async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        let tables = self.inner.read().await;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_category_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let tables = self.inner.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        let tables = self.inner.read().await;
        Ok(tables.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn insert_category(&self, name: String, slug: String) -> AppResult<Category> {
        let mut tables = self.inner.write().await;
        if tables.categories.iter().any(|c| c.name == name) {
            return Err(AppError::Conflict(CATEGORY_TAKEN.into()));
        }
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name,
            slug,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        name: String,
        slug: String,
    ) -> AppResult<Option<Category>> {
        let mut tables = self.inner.write().await;
        if tables.categories.iter().any(|c| c.name == name && c.id != id) {
            return Err(AppError::Conflict(CATEGORY_TAKEN.into()));
        }
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.name = name;
        category.slug = slug;
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        if tables.products.iter().any(|p| p.category_id == id) {
            return Err(constraint(format!("category {id} is still referenced")));
        }
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        Ok(tables.categories.len() != before)
    }

    async fn insert_order(&self, order: NewOrder) -> AppResult<OrderRecord> {
        let mut tables = self.inner.write().await;
        let Some(buyer) = tables.accounts.get(&order.buyer_id) else {
            return Err(constraint(format!("unknown buyer {}", order.buyer_id)));
        };
        let now = Utc::now();
        let record = OrderRecord {
            order: Order {
                id: Uuid::new_v4(),
                buyer_id: order.buyer_id,
                payment: order.payment,
                status: OrderStatus::NotProcessed,
                created_at: now,
                updated_at: now,
            },
            items: order
                .items
                .into_iter()
                .enumerate()
                .map(|(position, item)| OrderItem {
                    position: position as i32,
                    product_id: item.product_id,
                    price: item.price,
                    product: None,
                })
                .collect(),
            buyer_name: Some(buyer.name.clone()),
        };
        tables.orders.push(record.clone());
        Ok(tables.with_products(record))
    }

    async fn find_orders_by_buyer(&self, buyer_id: Uuid) -> AppResult<Vec<OrderRecord>> {
        let tables = self.inner.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .filter(|r| r.order.buyer_id == buyer_id)
            .map(|r| tables.with_products(r.clone()))
            .collect())
    }

    async fn find_all_orders(&self) -> AppResult<Vec<OrderRecord>> {
        let tables = self.inner.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .map(|r| tables.with_products(r.clone()))
            .collect())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Option<Order>> {
        let mut tables = self.inner.write().await;
        let Some(record) = tables.orders.iter_mut().find(|r| r.order.id == id) else {
            return Ok(None);
        };
        record.order.status = status;
        record.order.updated_at = Utc::now();
        Ok(Some(record.order.clone()))
    }

    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        self.inner.write().await.audit.push(entry);
        Ok(())
    }
}
