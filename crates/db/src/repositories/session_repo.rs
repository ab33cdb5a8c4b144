//! Repository for `refresh_sessions`.
//!
//! A refresh token is single-use: [`SessionRepo::rotate`] claims the
//! presented session and opens its replacement in one transaction, so two
//! concurrent refreshes with the same token cannot both succeed.

use sqlx::PgPool;
use storyverse_core::types::{DbId, Timestamp};

use crate::models::session::{NewRefreshSession, RefreshSession};

const COLUMNS: &str = "id, user_id, token_hash, expires_at, revoked_at, created_at, updated_at";

pub struct SessionRepo;

impl SessionRepo {
    /// Open a session for a login or registration.
    pub async fn open(
        pool: &PgPool,
        input: &NewRefreshSession,
    ) -> Result<RefreshSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Exchange the live session matching `presented_hash` for a new one
    /// owned by the same user.
    ///
    /// Returns `None` when the hash is unknown, already revoked or expired;
    /// nothing is written in that case.
    pub async fn rotate(
        pool: &PgPool,
        presented_hash: &str,
        replacement_hash: &str,
        expires_at: Timestamp,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()
             RETURNING user_id",
        )
        .bind(presented_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, RefreshSession>(&query)
            .bind(user_id)
            .bind(replacement_hash)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(session))
    }

    /// Look up a session by token hash, live or not.
    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_sessions WHERE token_hash = $1");
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Log a user out everywhere. Returns how many sessions were still open.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
