use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Role;

pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub account_id: Uuid,
    pub role: Role,
}

/// HS256 token issuer/verifier. The key is fixed for the life of the process.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, account_id: Uuid, role: Role) -> Result<String, TokenError> {
        self.issue_at(account_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        account_id: Uuid,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at + Duration::days(TOKEN_LIFETIME_DAYS);
        let claims = Claims {
            sub: account_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        let account_id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)?;
        Ok(SessionClaims {
            account_id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"unit-test-secret-0123456789")
    }

    #[test]
    fn fresh_token_verifies() {
        let id = Uuid::new_v4();
        let token = service().issue(id, Role::Admin).unwrap();
        let claims = service().verify(&token).unwrap();
        assert_eq!(claims.account_id, id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn token_older_than_lifetime_is_expired() {
        let issued = Utc::now() - Duration::days(TOKEN_LIFETIME_DAYS) - Duration::seconds(5);
        let token = service()
            .issue_at(Uuid::new_v4(), Role::Standard, issued)
            .unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_near_end_of_lifetime_still_verifies() {
        let issued = Utc::now() - Duration::days(TOKEN_LIFETIME_DAYS) + Duration::minutes(5);
        let token = service()
            .issue_at(Uuid::new_v4(), Role::Standard, issued)
            .unwrap();
        assert!(service().verify(&token).is_ok());
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let other = TokenService::new(b"another-secret-9876543210");
        let token = other.issue(Uuid::new_v4(), Role::Standard).unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn tampered_or_garbage_token_is_invalid() {
        let token = service().issue(Uuid::new_v4(), Role::Standard).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(service().verify(&tampered), Err(TokenError::Invalid)));
        assert!(matches!(service().verify("abc.def"), Err(TokenError::Invalid)));
        assert!(matches!(service().verify(""), Err(TokenError::Invalid)));
    }
}
