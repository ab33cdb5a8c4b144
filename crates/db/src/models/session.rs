//! Refresh sessions backing the `/auth/refresh` rotation.

use sqlx::FromRow;
use storyverse_core::types::{DbId, Timestamp};

/// A row of `refresh_sessions`. The plaintext token is never stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    /// Set when the session is rotated or the user logs out.
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RefreshSession {
    /// Whether the token can still be exchanged at `now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Hash and expiry of a freshly minted refresh token.
#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
