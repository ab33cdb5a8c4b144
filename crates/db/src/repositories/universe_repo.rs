//! Repository for the `universes` table.

use sqlx::PgPool;
use storyverse_core::search::{page_offset, ExploreSort, EXPLORE_PAGE_SIZE};
use storyverse_core::types::DbId;

use crate::models::universe::{
    CreateUniverse, ExploreUniverse, Universe, UniverseWithCounts, UpdateUniverse,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, description, cover_image, is_public, allow_fork, \
                       forked_from_id, fork_count, created_at, updated_at";

/// Same columns qualified with the `u` alias, for joined queries.
const U_COLUMNS: &str = "u.id, u.user_id, u.name, u.description, u.cover_image, u.is_public, \
                         u.allow_fork, u.forked_from_id, u.fork_count, u.created_at, u.updated_at";

/// Correlated child counts, used by the listing queries.
const COUNTS: &str = "(SELECT COUNT(*) FROM timelines t WHERE t.universe_id = u.id) AS timelines_count, \
                      (SELECT COUNT(*) FROM characters c WHERE c.universe_id = u.id) AS characters_count";

/// Provides CRUD operations and listings for universes.
pub struct UniverseRepo;

impl UniverseRepo {
    /// Insert a new universe owned by `user_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateUniverse,
    ) -> Result<Universe, sqlx::Error> {
        let query = format!(
            "INSERT INTO universes (user_id, name, description, cover_image, is_public, allow_fork)
             VALUES ($1, $2, $3, $4, COALESCE($5, false), COALESCE($6, false))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Universe>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.cover_image)
            .bind(input.is_public)
            .bind(input.allow_fork)
            .fetch_one(pool)
            .await
    }

    /// Find a universe by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Universe>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM universes WHERE id = $1");
        sqlx::query_as::<_, Universe>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's universes, newest first, with child counts.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UniverseWithCounts>, sqlx::Error> {
        let query = format!(
            "SELECT {U_COLUMNS}, {COUNTS}
             FROM universes u
             WHERE u.user_id = $1
             ORDER BY u.created_at DESC, u.id DESC"
        );
        sqlx::query_as::<_, UniverseWithCounts>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a universe. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUniverse,
    ) -> Result<Option<Universe>, sqlx::Error> {
        let query = format!(
            "UPDATE universes SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                cover_image = COALESCE($4, cover_image),
                is_public = COALESCE($5, is_public),
                allow_fork = COALESCE($6, allow_fork)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Universe>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.cover_image)
            .bind(input.is_public)
            .bind(input.allow_fork)
            .fetch_optional(pool)
            .await
    }

    /// Delete a universe and, through cascades, everything in it.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM universes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Explore
    // -----------------------------------------------------------------------

    /// One page of public universes, optionally filtered by a name or
    /// description substring.
    pub async fn explore(
        pool: &PgPool,
        search: Option<&str>,
        sort: ExploreSort,
        page: Option<i64>,
    ) -> Result<Vec<ExploreUniverse>, sqlx::Error> {
        let query = format!(
            "SELECT {U_COLUMNS}, owner.username AS owner_name, {COUNTS}
             FROM universes u
             JOIN users owner ON owner.id = u.user_id
             WHERE u.is_public = true
               AND ($1::text IS NULL OR u.name ILIKE $1 OR u.description ILIKE $1)
             ORDER BY {order_by}
             LIMIT $2 OFFSET $3",
            order_by = sort.order_by(),
        );
        sqlx::query_as::<_, ExploreUniverse>(&query)
            .bind(search.map(storyverse_core::search::like_pattern))
            .bind(EXPLORE_PAGE_SIZE)
            .bind(page_offset(page, EXPLORE_PAGE_SIZE))
            .fetch_all(pool)
            .await
    }

    /// Total public universes matching the explore filter.
    pub async fn count_public(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM universes u
             WHERE u.is_public = true
               AND ($1::text IS NULL OR u.name ILIKE $1 OR u.description ILIKE $1)",
        )
        .bind(search.map(storyverse_core::search::like_pattern))
        .fetch_one(pool)
        .await
    }
}
