/// Session lifecycle: issuance, verification, revocation
///
/// Session tokens are stateless-signed but revocable: the signature gives
/// O(1) verification, and membership in the owning user's live-token set
/// gives server-side invalidation at the cost of one user lookup per
/// authenticated request.
///
/// Invariants enforced here:
///
/// - Issuance is not complete until the token has been appended to the
///   user's token set **and persisted**; only then is the token returned.
/// - Verification rejects a structurally valid token that is no longer in
///   the set (revoked), and every verification failure — bad signature,
///   expired, user deleted, token revoked, store error — collapses into the
///   same opaque [`SessionError::InvalidToken`] so callers cannot tell the
///   cases apart.
/// - Revoking one token removes exactly that entry and leaves the user's
///   other sessions live; revoking all clears the set.

use sqlx::PgPool;
use uuid::Uuid;

use super::token::{decode_token, sign_token, Claims, TokenError};
use crate::models::user::User;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The presented token is not a live session. Deliberately opaque.
    #[error("Invalid or revoked session token")]
    InvalidToken,

    /// Tried to issue a session for a user id with no user row
    #[error("Cannot issue session: user {0} does not exist")]
    UnknownUser(Uuid),

    /// Signing failed during issuance
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Persisting a token-set mutation failed
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Issues a new session token for a user
///
/// Signs a token for `user_id`, appends it to the user's live-token set,
/// and persists that append. The token string is returned only after the
/// write succeeds — a token the server would not recognize is never handed
/// out.
///
/// # Errors
///
/// Fails if signing fails, the user does not exist, or the append cannot be
/// persisted.
pub async fn issue(pool: &PgPool, secret: &str, user_id: Uuid) -> Result<String, SessionError> {
    let token = sign_token(&Claims::new(user_id), secret)?;

    let appended = User::append_token(pool, user_id, &token).await?;
    if !appended {
        return Err(SessionError::UnknownUser(user_id));
    }

    tracing::debug!(user_id = %user_id, "Issued session token");
    Ok(token)
}

/// Verifies a bearer token and resolves the acting user
///
/// Checks the signature, loads the user the token claims to belong to, and
/// requires the exact token string to be a member of that user's live-token
/// set. Any failure along the way — malformed token, bad signature, expired,
/// user gone, token revoked, store error — returns the same
/// [`SessionError::InvalidToken`].
pub async fn authenticate(pool: &PgPool, secret: &str, token: &str) -> Result<User, SessionError> {
    let claims = decode_token(token, secret).map_err(|_| SessionError::InvalidToken)?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|_| SessionError::InvalidToken)?
        .ok_or(SessionError::InvalidToken)?;

    if !user.tokens.iter().any(|t| t == token) {
        return Err(SessionError::InvalidToken);
    }

    Ok(user)
}

/// Revokes a single session (logout)
///
/// Removes exactly the matching entry from the user's live-token set.
/// Idempotent: revoking a token that is already absent is a no-op.
pub async fn revoke(pool: &PgPool, user_id: Uuid, token: &str) -> Result<(), SessionError> {
    User::remove_token(pool, user_id, token).await?;
    tracing::debug!(user_id = %user_id, "Revoked session token");
    Ok(())
}

/// Revokes every session for a user ("log out everywhere")
pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<(), SessionError> {
    User::clear_tokens(pool, user_id).await?;
    tracing::debug!(user_id = %user_id, "Revoked all session tokens");
    Ok(())
}
