use std::env;

use anyhow::Context;

use crate::payment::braintree::BraintreeEnvironment;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub braintree: BraintreeConfig,
    pub max_body_bytes: usize,
    pub cors_allow_origin: Option<String>,
    pub concurrency_limit: usize,
}

#[derive(Clone)]
pub struct BraintreeConfig {
    pub environment: BraintreeEnvironment,
    pub public_key: String,
    pub private_key: String,
    pub merchant_account_id: Option<String>,
    pub timeout_secs: u64,
}

// Keys stay out of debug output.
impl std::fmt::Debug for BraintreeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraintreeConfig")
            .field("environment", &self.environment)
            .field("merchant_account_id", &self.merchant_account_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 8080);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        if jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET must be at least 16 bytes");
        }

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            braintree: BraintreeConfig::from_env()?,
            max_body_bytes: parse_or("MAX_BODY_BYTES", 2 * 1024 * 1024),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").ok().filter(|v| !v.is_empty()),
            concurrency_limit: parse_or("CONCURRENCY_LIMIT", 100),
        })
    }
}

impl BraintreeConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = env::var("BRAINTREE_ENVIRONMENT")
            .unwrap_or_else(|_| "sandbox".to_string())
            .parse::<BraintreeEnvironment>()?;
        let public_key =
            env::var("BRAINTREE_PUBLIC_KEY").context("BRAINTREE_PUBLIC_KEY is not set")?;
        let private_key =
            env::var("BRAINTREE_PRIVATE_KEY").context("BRAINTREE_PRIVATE_KEY is not set")?;
        Ok(Self {
            environment,
            public_key,
            private_key,
            merchant_account_id: env::var("BRAINTREE_MERCHANT_ACCOUNT_ID")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout_secs: parse_or("BRAINTREE_TIMEOUT_SECS", 30),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
