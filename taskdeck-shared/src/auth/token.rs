/// Session-token signing and signature validation
///
/// Session tokens are HS256-signed JWTs encoding the owning user's id. The
/// signature half is stateless: [`sign_token`] and [`decode_token`] know
/// nothing about revocation. A structurally valid token is only a live
/// session while it remains in its user's token set, which is checked by
/// [`crate::auth::sessions`].
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC-SHA256) with a process-wide secret
/// - **Expiration**: 30 days from issuance, enforced during validation
/// - **Uniqueness**: every token carries a random `jti`, so two logins in
///   the same second still produce distinct strings (revoking one must not
///   revoke the other)
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::token::{decode_token, sign_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = sign_token(&Claims::new(user_id), "secret-key-at-least-32-bytes-long")?;
/// let claims = decode_token(&token, "secret-key-at-least-32-bytes-long")?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer claim value
const ISSUER: &str = "taskdeck";

/// Token lifetime from issuance
pub fn token_lifetime() -> Duration {
    Duration::days(30)
}

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token
    #[error("Failed to sign token: {0}")]
    SignError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature check or decoding failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID this session belongs to
    pub sub: Uuid,

    /// Issuer - always "taskdeck"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token ID
    pub jti: Uuid,
}

impl Claims {
    /// Creates claims for a new session with the default lifetime
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + token_lifetime()).timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Checks whether the token has passed its expiration time
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a session-token string
///
/// # Errors
///
/// Returns `TokenError::SignError` if encoding fails
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| TokenError::SignError(format!("Token encoding failed: {}", e)))
}

/// Validates a token's signature and extracts its claims
///
/// Verifies the signature, the issuer, and the expiration time. A token that
/// passes here may still be revoked; revocation is checked against the
/// user's live-token set, not the signature.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
