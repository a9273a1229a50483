//! Bearer-token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying the principal id, its role, and an
//! admin flag, valid for seven days.  The signing secret comes from
//! process configuration.  Handlers call [`TokenService::authenticate`]
//! with the request headers; admin-only routes additionally go through
//! [`Claims::require_admin`].

use axum::http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServerError;
use mela_core::types::Role;

/// Token lifetime: 7 days.
const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signed claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id of the principal.
    pub sub: Uuid,
    pub role: Role,
    pub is_admin: bool,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Reject non-admin principals.
    pub fn require_admin(&self) -> Result<(), ServerError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ServerError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Reject non-vendor principals.
    pub fn require_vendor(&self) -> Result<(), ServerError> {
        if self.role == Role::Vendor {
            Ok(())
        } else {
            Err(ServerError::Forbidden("Access denied".to_string()))
        }
    }
}

/// Issues and verifies bearer tokens.  Cheap to clone.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Issue a signed 7-day token for a principal.
    pub fn issue(&self, identity_id: Uuid, role: Role) -> Result<String, ServerError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: identity_id,
            role,
            is_admin: role == Role::Admin,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("token encode: {e}")))
    }

    /// Verify a token string and extract its claims.  Expired or
    /// tampered tokens are rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, ServerError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized("Invalid or expired token".to_string()))
    }

    /// Extract and verify the `Authorization: Bearer` token from request
    /// headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, ServerError> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ServerError::Unauthorized("Missing bearer token".to_string()))?;
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn issue_and_verify_round_trip() {
        let svc = TokenService::new("test-secret");
        let id = Uuid::new_v4();
        let token = svc.issue(id, Role::Vendor).unwrap();

        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Vendor);
        assert!(!claims.is_admin);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn admin_token_carries_flag() {
        let svc = TokenService::new("test-secret");
        let token = svc.issue(Uuid::new_v4(), Role::Admin).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert!(claims.is_admin);
        assert!(claims.require_admin().is_ok());
        assert!(claims.require_vendor().is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");
        let token = issuer.issue(Uuid::new_v4(), Role::Vendor).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn authenticate_reads_bearer_header() {
        let svc = TokenService::new("test-secret");
        let token = svc.issue(Uuid::new_v4(), Role::Vendor).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert!(svc.authenticate(&headers).is_ok());

        let empty = HeaderMap::new();
        assert!(matches!(
            svc.authenticate(&empty).unwrap_err(),
            ServerError::Unauthorized(_)
        ));
    }
}
