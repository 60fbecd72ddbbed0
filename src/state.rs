use std::sync::Arc;

use crate::{payment::PaymentGateway, security::token::TokenService, store::Store};

/// Process-wide dependencies, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenService,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            gateway,
        }
    }
}
