//! Repository for the `tags` table.

use sqlx::PgPool;
use storyverse_core::types::DbId;
use storyverse_core::validation::TagCategory;

use crate::models::tag::{CreateTag, Tag, TagWithCount, UpdateTag};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, universe_id, name, color, category, created_at, updated_at";

/// Provides CRUD operations for tags.
pub struct TagRepo;

impl TagRepo {
    /// Insert a new tag, returning the created row.
    ///
    /// Tag names are unique per universe; a duplicate fails with
    /// `uq_tags_universe_id_name`.
    pub async fn create(
        pool: &PgPool,
        universe_id: DbId,
        input: &CreateTag,
    ) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (universe_id, name, color, category)
             VALUES ($1, $2, $3, COALESCE($4, $5))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(universe_id)
            .bind(&input.name)
            .bind(&input.color)
            .bind(&input.category)
            .bind(TagCategory::Other.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a tag by name within a universe, or create it with the default
    /// category. The `bool` is `true` when the tag was created.
    pub async fn find_or_create(
        pool: &PgPool,
        universe_id: DbId,
        name: &str,
    ) -> Result<(Tag, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (universe_id, name, category)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_tags_universe_id_name DO NOTHING
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Tag>(&query)
            .bind(universe_id)
            .bind(name)
            .bind(TagCategory::Other.as_str())
            .fetch_optional(pool)
            .await?;
        if let Some(tag) = created {
            return Ok((tag, true));
        }

        let query = format!("SELECT {COLUMNS} FROM tags WHERE universe_id = $1 AND name = $2");
        let tag = sqlx::query_as::<_, Tag>(&query)
            .bind(universe_id)
            .bind(name)
            .fetch_one(pool)
            .await?;
        Ok((tag, false))
    }

    /// Find a tag by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a universe's tags by category then name, with scene counts.
    pub async fn list_by_universe(
        pool: &PgPool,
        universe_id: DbId,
    ) -> Result<Vec<TagWithCount>, sqlx::Error> {
        sqlx::query_as::<_, TagWithCount>(
            "SELECT t.id, t.universe_id, t.name, t.color, t.category, t.created_at, t.updated_at,
                (SELECT COUNT(*) FROM scene_tags st WHERE st.tag_id = t.id) AS scenes_count
             FROM tags t
             WHERE t.universe_id = $1
             ORDER BY t.category ASC, t.name ASC, t.id ASC",
        )
        .bind(universe_id)
        .fetch_all(pool)
        .await
    }

    /// Tags attached to a scene, by name.
    pub async fn list_for_scene(pool: &PgPool, scene_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.universe_id, t.name, t.color, t.category, t.created_at, t.updated_at
             FROM tags t
             JOIN scene_tags st ON st.tag_id = t.id
             WHERE st.scene_id = $1
             ORDER BY t.name ASC, t.id ASC",
        )
        .bind(scene_id)
        .fetch_all(pool)
        .await
    }

    /// How many of `ids` belong to the universe. Used to reject foreign ids.
    pub async fn count_in_universe(
        pool: &PgPool,
        universe_id: DbId,
        ids: &[DbId],
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(DISTINCT id) FROM tags WHERE universe_id = $1 AND id = ANY($2)",
        )
        .bind(universe_id)
        .bind(ids)
        .fetch_one(pool)
        .await
    }

    /// Update a tag. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET
                name = COALESCE($2, name),
                color = COALESCE($3, color),
                category = COALESCE($4, category)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .bind(&input.category)
            .fetch_optional(pool)
            .await
    }

    /// Delete a tag. Its scene links go with it.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Transaction helpers
    // -----------------------------------------------------------------------

    /// Insert a tag inside an open transaction, returning its id.
    pub(crate) async fn insert_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        universe_id: DbId,
        name: &str,
        color: Option<&str>,
        category: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO tags (universe_id, name, color, category)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(universe_id)
        .bind(name)
        .bind(color)
        .bind(category)
        .fetch_one(&mut **tx)
        .await
    }
}
