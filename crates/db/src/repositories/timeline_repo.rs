//! Repository for the `timelines` table.
//!
//! Canon is exclusive within a universe: whenever a timeline becomes canon,
//! every sibling is unset in the same transaction.

use sqlx::PgPool;
use storyverse_core::branching::{BranchLink, DEFAULT_TIMELINE_COLOR};
use storyverse_core::types::DbId;

use crate::models::timeline::{CreateTimeline, Timeline, TimelineWithCounts, UpdateTimeline};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, universe_id, name, description, color, is_canon, branch_from_id, created_at, updated_at";

/// Same columns qualified with the `t` alias, plus the listing extras.
const COUNTED_COLUMNS: &str = "t.id, t.universe_id, t.name, t.description, t.color, t.is_canon, \
     t.branch_from_id, t.created_at, t.updated_at, \
     (SELECT COUNT(*) FROM scenes s WHERE s.timeline_id = t.id) AS scenes_count, \
     origin.timeline_id AS branch_from_timeline_id";

/// Provides CRUD operations for timelines.
pub struct TimelineRepo;

impl TimelineRepo {
    /// Insert a new timeline, returning the created row.
    pub async fn create(
        pool: &PgPool,
        universe_id: DbId,
        input: &CreateTimeline,
    ) -> Result<Timeline, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let is_canon = input.is_canon.unwrap_or(false);
        if is_canon {
            Self::unset_canon_inner(&mut tx, universe_id, None).await?;
        }

        let query = format!(
            "INSERT INTO timelines (universe_id, name, description, color, is_canon, branch_from_id)
             VALUES ($1, $2, $3, COALESCE($4, $5), $6, $7)
             RETURNING {COLUMNS}"
        );
        let timeline = sqlx::query_as::<_, Timeline>(&query)
            .bind(universe_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(DEFAULT_TIMELINE_COLOR)
            .bind(is_canon)
            .bind(input.branch_from_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(timeline)
    }

    /// Find a timeline by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Timeline>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM timelines WHERE id = $1");
        sqlx::query_as::<_, Timeline>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a universe's timelines, canon first then by name.
    pub async fn list_by_universe(
        pool: &PgPool,
        universe_id: DbId,
    ) -> Result<Vec<TimelineWithCounts>, sqlx::Error> {
        let query = format!(
            "SELECT {COUNTED_COLUMNS}
             FROM timelines t
             LEFT JOIN scenes origin ON origin.id = t.branch_from_id
             WHERE t.universe_id = $1
             ORDER BY t.is_canon DESC, t.name ASC, t.id ASC"
        );
        sqlx::query_as::<_, TimelineWithCounts>(&query)
            .bind(universe_id)
            .fetch_all(pool)
            .await
    }

    /// Timelines that branch from the given scene.
    pub async fn list_branches_of_scene(
        pool: &PgPool,
        scene_id: DbId,
    ) -> Result<Vec<TimelineWithCounts>, sqlx::Error> {
        let query = format!(
            "SELECT {COUNTED_COLUMNS}
             FROM timelines t
             LEFT JOIN scenes origin ON origin.id = t.branch_from_id
             WHERE t.branch_from_id = $1
             ORDER BY t.created_at ASC, t.id ASC"
        );
        sqlx::query_as::<_, TimelineWithCounts>(&query)
            .bind(scene_id)
            .fetch_all(pool)
            .await
    }

    /// Update a timeline. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTimeline,
    ) -> Result<Option<Timeline>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if input.is_canon == Some(true) {
            let universe_id: Option<DbId> =
                sqlx::query_scalar("SELECT universe_id FROM timelines WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some(universe_id) = universe_id {
                Self::unset_canon_inner(&mut tx, universe_id, Some(id)).await?;
            }
        }

        let query = format!(
            "UPDATE timelines SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                color = COALESCE($5, color),
                is_canon = COALESCE($6, is_canon),
                branch_from_id = CASE WHEN $7 THEN $8 ELSE branch_from_id END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let timeline = sqlx::query_as::<_, Timeline>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.description.is_some())
            .bind(input.description.as_ref().and_then(|v| v.as_deref()))
            .bind(&input.color)
            .bind(input.is_canon)
            .bind(input.branch_from_id.is_some())
            .bind(input.branch_from_id.flatten())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(timeline)
    }

    /// Delete a timeline and its scenes. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM timelines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Branch references of every timeline in a universe, resolved to the
    /// origin scene's timeline. Feeds the ancestry walk.
    pub async fn branch_links(
        pool: &PgPool,
        universe_id: DbId,
    ) -> Result<Vec<BranchLink>, sqlx::Error> {
        let rows: Vec<(DbId, Option<DbId>, Option<DbId>)> = sqlx::query_as(
            "SELECT t.id, t.branch_from_id, origin.timeline_id
             FROM timelines t
             LEFT JOIN scenes origin ON origin.id = t.branch_from_id
             WHERE t.universe_id = $1",
        )
        .bind(universe_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timeline_id, branch_from_scene_id, origin_timeline_id)| BranchLink {
                timeline_id,
                branch_from_scene_id,
                origin_timeline_id,
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Transaction helpers
    // -----------------------------------------------------------------------

    /// Clear the canon flag on every timeline of the universe except `keep`.
    pub(crate) async fn unset_canon_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        universe_id: DbId,
        keep: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE timelines SET is_canon = false
             WHERE universe_id = $1 AND is_canon = true AND ($2::bigint IS NULL OR id <> $2)",
        )
        .bind(universe_id)
        .bind(keep)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Insert a timeline inside an open transaction.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn insert_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        universe_id: DbId,
        name: &str,
        description: Option<&str>,
        color: &str,
        is_canon: bool,
        branch_from_id: Option<DbId>,
    ) -> Result<Timeline, sqlx::Error> {
        let query = format!(
            "INSERT INTO timelines (universe_id, name, description, color, is_canon, branch_from_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Timeline>(&query)
            .bind(universe_id)
            .bind(name)
            .bind(description)
            .bind(color)
            .bind(is_canon)
            .bind(branch_from_id)
            .fetch_one(&mut **tx)
            .await
    }
}
