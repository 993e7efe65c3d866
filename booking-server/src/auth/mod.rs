//! Actor JWT authentication for the booking API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{AppError, ErrorCode};

use crate::state::AppState;

/// JWT claims for an authenticated actor
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Actor ID (user or staff member)
    pub sub: String,
    /// Role: customer | merchant | staff
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated actor identity extracted from JWT
#[derive(Debug, Clone)]
pub struct ActorIdentity {
    pub actor_id: i64,
    pub role: ActorRole,
}

/// Who is calling the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Customer,
    Merchant,
    Staff,
}

impl ActorRole {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(ActorRole::Customer),
            "merchant" => Some(ActorRole::Merchant),
            "staff" => Some(ActorRole::Staff),
            _ => None,
        }
    }

    /// Merchant and staff actors may act on any booking in their store;
    /// customers only on their own.
    pub fn is_operator(self) -> bool {
        matches!(self, ActorRole::Merchant | ActorRole::Staff)
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for an actor.
pub fn create_token(
    actor_id: i64,
    role: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = ActorClaims {
        sub: actor_id.to_string(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware that extracts and verifies the actor JWT from the Authorization header.
pub async fn actor_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Missing Authorization header")
                .into_response()
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::with_message(ErrorCode::NotAuthenticated, "Invalid Authorization format")
            .into_response()
    })?;

    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<ActorClaims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        AppError::with_message(ErrorCode::TokenInvalid, "Invalid or expired token")
            .into_response()
    })?;

    let actor_id: i64 = token_data.claims.sub.parse().map_err(|_| {
        AppError::with_message(ErrorCode::TokenInvalid, "Malformed subject claim").into_response()
    })?;
    let role = ActorRole::parse(&token_data.claims.role).ok_or_else(|| {
        AppError::with_message(ErrorCode::TokenInvalid, "Unknown actor role").into_response()
    })?;

    request.extensions_mut().insert(ActorIdentity { actor_id, role });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing() {
        assert_eq!(ActorRole::parse("customer"), Some(ActorRole::Customer));
        assert_eq!(ActorRole::parse("merchant"), Some(ActorRole::Merchant));
        assert_eq!(ActorRole::parse("staff"), Some(ActorRole::Staff));
        assert_eq!(ActorRole::parse("admin"), None);
    }

    #[test]
    fn operator_roles() {
        assert!(!ActorRole::Customer.is_operator());
        assert!(ActorRole::Merchant.is_operator());
        assert!(ActorRole::Staff.is_operator());
    }

    #[test]
    fn token_round_trip() {
        let token = create_token(42, "customer", "test-secret").unwrap();
        let data = jsonwebtoken::decode::<ActorClaims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "42");
        assert_eq!(data.claims.role, "customer");
    }
}
