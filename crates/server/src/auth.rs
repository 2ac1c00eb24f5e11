//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user id. The middleware
//! validates the token and inserts [`AuthUser`] into request extensions.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
}

pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

/// Authenticated caller, available to handlers as `Extension<AuthUser>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

impl AuthManager {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_secret),
            decoding_key: DecodingKey::from_secret(&config.jwt_secret),
            validation,
            token_ttl: config.access_token_ttl,
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, ServerError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ServerError::Internal("system clock is before UNIX_EPOCH".into()))?;
        let exp = now + self.token_ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.as_secs() as usize,
            exp: exp.as_secs() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("failed to sign token: {e}")))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, ServerError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => ServerError::Unauthorized("token expired".into()),
                _ => ServerError::Unauthorized("invalid token".into()),
            },
        )?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServerError::Unauthorized("invalid token subject".into()))
    }

    pub fn expires_in(&self) -> Duration {
        self.token_ttl
    }
}

/// Decodes the configured JWT secret: base64, or raw ASCII of at least 32 bytes.
pub fn decode_secret_key(raw: &str) -> Result<Vec<u8>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("JWT secret cannot be empty".to_string());
    }
    let decoded = match BASE64.decode(trimmed) {
        Ok(bytes) if bytes.len() >= 32 => bytes,
        _ if trimmed.len() >= 32 => trimmed.as_bytes().to_vec(),
        _ => return Err("JWT secret must be at least 32 bytes, raw or base64 encoded".to_string()),
    };
    Ok(decoded)
}

pub(crate) async fn require_auth(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) =
        auth_header.map_err(|_| ServerError::Unauthorized("missing bearer token".into()))?;
    let user_id = state.auth.validate_token(bearer.token().trim())?;

    request.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(ttl: Duration) -> AuthManager {
        AuthManager::new(&AuthConfig {
            jwt_secret: b"0123456789abcdef0123456789abcdef".to_vec(),
            access_token_ttl: ttl,
        })
    }

    #[test]
    fn token_round_trips_user_id() {
        let auth = manager(Duration::from_secs(3600));
        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id).unwrap();
        assert_eq!(auth.validate_token(&token).unwrap(), user_id);
    }

    #[test]
    fn foreign_token_is_rejected() {
        let token = manager(Duration::from_secs(3600))
            .issue_token(Uuid::new_v4())
            .unwrap();
        let other = AuthManager::new(&AuthConfig {
            jwt_secret: b"ffffffffffffffffffffffffffffffff".to_vec(),
            access_token_ttl: Duration::from_secs(3600),
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(ServerError::Unauthorized(_))
        ));
        assert!(other.validate_token("not.a.jwt").is_err());
    }

    #[test]
    fn secret_accepts_base64_or_raw() {
        let raw = "0123456789abcdef0123456789abcdef";
        assert_eq!(decode_secret_key(raw).unwrap(), raw.as_bytes());
        let encoded = BASE64.encode([7_u8; 32]);
        assert_eq!(decode_secret_key(&encoded).unwrap(), vec![7_u8; 32]);
        assert!(decode_secret_key("  ").is_err());
        assert!(decode_secret_key("short").is_err());
    }
}
