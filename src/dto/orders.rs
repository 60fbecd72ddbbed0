use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Order, OrderItem},
    store::OrderRecord,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub buyer_name: Option<String>,
    pub items: Vec<OrderItem>,
}

impl From<OrderRecord> for OrderWithItems {
    fn from(record: OrderRecord) -> Self {
        Self {
            order: record.order,
            buyer_name: record.buyer_name,
            items: record.items,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartLine {
    #[serde(alias = "_id")]
    pub product_id: Uuid,
    /// Minor currency units, as shown to the buyer.
    pub price: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cart: Vec<CartLine>,
    /// Single-use payment method nonce from the gateway's client SDK.
    pub nonce: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientTokenResponse {
    pub client_token: String,
}
