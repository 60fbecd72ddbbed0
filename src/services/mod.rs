pub mod auth_service;
pub mod category_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;

use crate::error::{AppError, AppResult};

/// Trimmed, non-empty value or a field-level validation error.
pub(crate) fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

/// `None` for absent or blank optional fields.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        assert!(required(None, "Name is required").is_err());
        assert!(required(Some("   ".into()), "Name is required").is_err());
        assert_eq!(required(Some(" Ann ".into()), "x").unwrap(), "Ann");
    }
}
