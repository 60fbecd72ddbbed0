//! Payment gateway capability used by checkout.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::PaymentRecord;

pub mod braintree;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The processor refused the charge; safe to show to the buyer.
    #[error("{0}")]
    Declined(String),

    #[error("payment provider error")]
    Provider(String),

    #[error("payment provider unreachable")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct SaleOptions {
    /// Capture immediately instead of leaving an authorization open.
    pub submit_for_settlement: bool,
}

impl Default for SaleOptions {
    fn default() -> Self {
        Self {
            submit_for_settlement: true,
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Token handed to the storefront's client SDK to collect a payment nonce.
    async fn generate_client_token(&self) -> Result<String, GatewayError>;

    /// Charge `amount` (minor units) against a single-use payment nonce.
    async fn sale(
        &self,
        amount: i64,
        nonce: &str,
        options: SaleOptions,
    ) -> Result<PaymentRecord, GatewayError>;

    /// Void or refund a previously successful sale.
    async fn void(&self, transaction_id: &str) -> Result<(), GatewayError>;
}

/// Render minor units as a two-decimal amount string, e.g. `3500` -> `"35.00"`.
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Parse a decimal amount string into minor units. Extra fraction digits are
/// rejected rather than rounded.
pub fn parse_amount(value: &str) -> Option<i64> {
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let frac: i64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<2}").parse().ok()?
    };
    whole.checked_mul(100)?.checked_add(frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_format_with_two_decimals() {
        assert_eq!(format_amount(3500), "35.00");
        assert_eq!(format_amount(7), "0.07");
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(123456), "1234.56");
    }

    #[test]
    fn amounts_parse_back_to_minor_units() {
        assert_eq!(parse_amount("35.00"), Some(3500));
        assert_eq!(parse_amount("35.5"), Some(3550));
        assert_eq!(parse_amount("12"), Some(1200));
        assert_eq!(parse_amount("1.234"), None);
        assert_eq!(parse_amount("abc"), None);
    }
}
