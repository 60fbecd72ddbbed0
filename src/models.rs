use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Role::Standard),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// Stored account. Never serialized: use [`AccountProfile`] for responses.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub address: String,
    pub security_answer_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub address: String,
    pub security_answer_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            address: account.address.clone(),
            role: account.role,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category fields embedded in product responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Minor currency units.
    pub price: i64,
    pub category_id: Uuid,
    pub quantity: i32,
    pub shipping: bool,
    pub has_photo: bool,
    /// Filled on reads; `None` only if the category row is gone.
    #[serde(default)]
    pub category: Option<CategorySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields embedded in order items. Never carries the photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            category_id: product.category_id,
        }
    }
}

/// Field values for a product insert or full update.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    pub quantity: i32,
    pub shipping: bool,
}

/// Photo bytes submitted with a product write.
#[derive(Debug, Clone)]
pub struct PhotoBlob {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct ProductPhoto {
    pub product_id: Uuid,
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    NotProcessed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::NotProcessed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::NotProcessed => "not-processed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status `{s}`"))
    }
}

/// Transaction record returned by the payment gateway for a captured sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub status: String,
    /// Minor currency units.
    pub amount: i64,
    #[schema(value_type = Object)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub payment: PaymentRecord,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub position: i32,
    pub product_id: Uuid,
    /// Price charged, as submitted in the cart.
    pub price: i64,
    /// Current catalog entry; `None` once the product is deleted.
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub price: i64,
}

/// Items are stored in the given order and numbered from 0.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: Uuid,
    pub items: Vec<NewOrderItem>,
    pub payment: PaymentRecord,
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: &'static str,
    pub resource: Option<&'static str>,
    pub metadata: Option<serde_json::Value>,
}

/// URL-safe slug derived from a display name.
pub fn slug_for(name: &str) -> String {
    slug::slugify(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_through_kebab_case() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        let json = serde_json::to_string(&OrderStatus::NotProcessed).unwrap();
        assert_eq!(json, "\"not-processed\"");
        assert!("Not Process".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("standard".parse::<Role>(), Ok(Role::Standard));
        assert!("1".parse::<Role>().is_err());
    }

    #[test]
    fn slug_is_lowercase_and_dashed() {
        assert_eq!(slug_for("Kids Collection"), "kids-collection");
        assert_eq!(slug_for("  Ferris Mug!! 2.0 "), "ferris-mug-2-0");
    }
}
