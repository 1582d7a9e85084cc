//! Session JWT issued after a successful OTP verification.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default session lifetime in seconds (7 days).
pub const SESSION_TOKEN_EXP: u64 = 604_800;

/// Identity extracted from a validated session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub phone: String,
    pub email: String,
    pub exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user ID (UUID string) |
/// | `phone` | custom | E.164 phone |
/// | `email` | custom | email at time of issue |
/// | `exp` | `exp` | seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub phone: String,
    pub email: String,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign a session token valid for `ttl_secs`. Returns the token and its `exp`.
pub fn issue_session_token(
    user_id: Uuid,
    phone: &str,
    email: &str,
    secret: &str,
    ttl_secs: u64,
) -> Result<(String, u64), SessionTokenError> {
    let exp = now_secs() + ttl_secs;
    let claims = SessionClaims {
        sub: user_id.to_string(),
        phone: phone.to_owned(),
        email: email.to_owned(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(SessionTokenError::Signing)?;
    Ok((token, exp))
}

/// Validate a session token (HS256, `exp` + `sub` required, default 60s leeway).
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionInfo, SessionTokenError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => SessionTokenError::InvalidSignature,
        _ => SessionTokenError::Malformed,
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| SessionTokenError::Malformed)?;

    Ok(SessionInfo {
        user_id,
        phone: data.claims.phone,
        email: data.claims.email,
        exp: data.claims.exp,
    })
}
