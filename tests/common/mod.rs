#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storefront_api::{
    middleware::auth::{AdminUser, AuthUser},
    models::{Account, Category, NewAccount, PaymentRecord, Product, ProductDraft, Role, slug_for},
    payment::{GatewayError, PaymentGateway, SaleOptions},
    security::{password, token::TokenService},
    state::AppState,
    store::{MemoryStore, Store},
};
use uuid::Uuid;

pub const SECRET: &[u8] = b"integration-test-signing-key";

pub enum SaleOutcome {
    Approve(&'static str),
    Decline(&'static str),
}

/// Scripted gateway that records every call.
pub struct FakeGateway {
    outcome: SaleOutcome,
    pub sales: Mutex<Vec<(i64, String)>>,
    pub voids: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn approving(transaction_id: &'static str) -> Self {
        Self::with(SaleOutcome::Approve(transaction_id))
    }

    pub fn declining(reason: &'static str) -> Self {
        Self::with(SaleOutcome::Decline(reason))
    }

    fn with(outcome: SaleOutcome) -> Self {
        Self {
            outcome,
            sales: Mutex::new(Vec::new()),
            voids: Mutex::new(Vec::new()),
        }
    }

    pub fn charged(&self) -> Vec<i64> {
        self.sales.lock().unwrap().iter().map(|(amount, _)| *amount).collect()
    }

    pub fn voided(&self) -> Vec<String> {
        self.voids.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn generate_client_token(&self) -> Result<String, GatewayError> {
        Ok("client-token".to_string())
    }

    async fn sale(
        &self,
        amount: i64,
        nonce: &str,
        _options: SaleOptions,
    ) -> Result<PaymentRecord, GatewayError> {
        self.sales.lock().unwrap().push((amount, nonce.to_string()));
        match self.outcome {
            SaleOutcome::Approve(id) => Ok(PaymentRecord {
                transaction_id: id.to_string(),
                status: "SUBMITTED_FOR_SETTLEMENT".to_string(),
                amount,
                raw: serde_json::json!({ "id": id }),
            }),
            SaleOutcome::Decline(reason) => Err(GatewayError::Declined(reason.to_string())),
        }
    }

    async fn void(&self, transaction_id: &str) -> Result<(), GatewayError> {
        self.voids.lock().unwrap().push(transaction_id.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub tokens: TokenService,
}

pub fn test_app(gateway: FakeGateway) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(gateway);
    let state = AppState::new(store.clone(), TokenService::new(SECRET), gateway.clone());
    TestApp {
        state,
        store,
        gateway,
        tokens: TokenService::new(SECRET),
    }
}

impl TestApp {
    pub async fn account(&self, email: &str, role: Role) -> Account {
        self.store
            .insert_account(NewAccount {
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: password::hash("secret1").unwrap(),
                phone: "555-0100".to_string(),
                address: "1 Test Street".to_string(),
                security_answer_hash: password::hash("blue").unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    pub async fn category(&self, name: &str) -> Category {
        self.store
            .insert_category(name.to_string(), slug_for(name))
            .await
            .unwrap()
    }

    pub async fn product(&self, name: &str, price: i64, category_id: Uuid) -> Product {
        self.store
            .insert_product(
                ProductDraft {
                    name: name.to_string(),
                    slug: slug_for(name),
                    description: format!("{name} description"),
                    price,
                    category_id,
                    quantity: 10,
                    shipping: true,
                },
                None,
            )
            .await
            .unwrap()
    }

    pub fn token_for(&self, account: &Account) -> String {
        self.tokens.issue(account.id, account.role).unwrap()
    }
}

pub fn auth(account: &Account) -> AuthUser {
    AuthUser {
        user_id: account.id,
        role: account.role,
    }
}

pub fn admin(account: &Account) -> AdminUser {
    AdminUser(auth(account))
}
