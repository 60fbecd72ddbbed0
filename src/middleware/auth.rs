//! Request gates: `AuthUser` authenticates the bearer of a session token,
//! `AdminUser` additionally checks the stored account's role.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, models::Role, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    /// Role at issuance time. Informational only; admin checks use the store.
    pub role: Role,
}

/// An authenticated caller whose persisted account currently has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Accepts both a bare token and `Bearer <token>`.
pub fn token_from_header(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        None if value.eq_ignore_ascii_case("bearer") => return None,
        None => value,
    };
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = token_from_header(auth_str)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let claims = state.tokens.verify(token)?;

        Ok(AuthUser {
            user_id: claims.account_id,
            role: claims.role,
        })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        // The token's role cannot be revoked, so ask the store.
        let account = state
            .store
            .find_account_by_id(user.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

        if account.role != Role::Admin {
            tracing::debug!(user_id = %user.user_id, "admin access denied");
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(AuthUser {
            user_id: account.id,
            role: account.role,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::token_from_header;

    #[test]
    fn accepts_bare_and_bearer_tokens() {
        assert_eq!(token_from_header("abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(token_from_header("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(token_from_header("bearer  abc"), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_values() {
        assert_eq!(token_from_header("Basic dXNlcjpwYXNz"), None);
        assert_eq!(token_from_header("Bearer "), None);
        assert_eq!(token_from_header("   "), None);
    }
}
