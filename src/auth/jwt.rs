//! Access token inspection and verification

use crate::auth::backend::AuthUser;
use crate::error::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token issued by the hosted auth service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Issued at
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiration time
    pub exp: i64,
}

impl AccessClaims {
    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_within(0)
    }

    /// True when the token expires in `margin_secs` seconds or less
    pub fn expires_within(&self, margin_secs: i64) -> bool {
        chrono::Utc::now().timestamp() + margin_secs >= self.exp
    }

    /// Seconds until expiry, negative when already expired
    pub fn remaining_secs(&self) -> i64 {
        self.exp - chrono::Utc::now().timestamp()
    }

    pub fn to_user(&self) -> AuthUser {
        AuthUser {
            id: self.sub.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// Decode claims without checking the signature or expiry.
///
/// Only for deciding when to refresh; never for authorization.
pub fn peek_claims(token: &str) -> Result<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Validate and decode an access token signed with the backend's shared secret
pub fn verify_token(token: &str, secret: &str, audience: Option<&str>) -> Result<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
