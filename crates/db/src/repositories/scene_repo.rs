//! Repository for the `scenes` table and its association tables.
//!
//! Within a timeline, scene orders stay contiguous from 1: inserts append,
//! deletes renumber, and reorders rewrite every order in one transaction.

use sqlx::PgPool;
use storyverse_core::ordering::{next_order, renumber, OrderAssignment, SceneSlot};
use storyverse_core::search::{clamp_limit, like_pattern, SortDirection, SortField, MAX_SEARCH_LIMIT};
use storyverse_core::text::content_word_count;
use storyverse_core::types::DbId;

use crate::models::scene::{
    CreateScene, Scene, SceneRef, SceneSearchParams, SceneSearchRow, SceneWithRelations,
    UpdateScene,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, timeline_id, title, content, summary, \"order\", date, time, location, \
                       mood, pov, is_branch_point, branch_question, word_count, created_at, updated_at";

/// Same columns qualified with the `s` alias, for joined queries.
const S_COLUMNS: &str = "s.id, s.timeline_id, s.title, s.content, s.summary, s.\"order\", s.date, \
                         s.time, s.location, s.mood, s.pov, s.is_branch_point, s.branch_question, \
                         s.word_count, s.created_at, s.updated_at";

/// Association id arrays for the scene aliased `s`.
const RELATION_COLUMNS: &str = "\
    COALESCE((SELECT array_agg(sc.character_id ORDER BY sc.character_id) \
              FROM scene_characters sc WHERE sc.scene_id = s.id), '{}'::bigint[]) AS character_ids, \
    COALESCE((SELECT array_agg(st.tag_id ORDER BY st.tag_id) \
              FROM scene_tags st WHERE st.scene_id = s.id), '{}'::bigint[]) AS tag_ids";

/// Provides CRUD, ordering and search operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Append a new scene to a timeline and attach its associations.
    ///
    /// The timeline row is locked so concurrent inserts cannot take the
    /// same order.
    pub async fn create(
        pool: &PgPool,
        timeline_id: DbId,
        input: &CreateScene,
    ) -> Result<SceneWithRelations, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM timelines WHERE id = $1 FOR UPDATE")
            .bind(timeline_id)
            .fetch_one(&mut *tx)
            .await?;
        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(\"order\") FROM scenes WHERE timeline_id = $1")
                .bind(timeline_id)
                .fetch_one(&mut *tx)
                .await?;
        let word_count = input.content.as_deref().map(content_word_count).unwrap_or(0);

        let query = format!(
            "INSERT INTO scenes (timeline_id, title, content, summary, \"order\", date, time, \
                location, mood, pov, is_branch_point, branch_question, word_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, false), $12, $13)
             RETURNING {COLUMNS}"
        );
        let scene = sqlx::query_as::<_, Scene>(&query)
            .bind(timeline_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.summary)
            .bind(next_order(max))
            .bind(&input.date)
            .bind(&input.time)
            .bind(&input.location)
            .bind(&input.mood)
            .bind(&input.pov)
            .bind(input.is_branch_point)
            .bind(&input.branch_question)
            .bind(word_count)
            .fetch_one(&mut *tx)
            .await?;

        let character_ids = input.character_ids.clone().unwrap_or_default();
        let tag_ids = input.tag_ids.clone().unwrap_or_default();
        Self::sync_characters_inner(&mut tx, scene.id, &character_ids).await?;
        Self::sync_tags_inner(&mut tx, scene.id, &tag_ids).await?;

        tx.commit().await?;
        Ok(SceneWithRelations {
            scene,
            character_ids,
            tag_ids,
        })
    }

    /// Find a scene by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a scene with its association ids.
    pub async fn find_with_relations(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SceneWithRelations>, sqlx::Error> {
        let query = format!("SELECT {S_COLUMNS}, {RELATION_COLUMNS} FROM scenes s WHERE s.id = $1");
        sqlx::query_as::<_, SceneWithRelations>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The universe owning a scene, through its timeline.
    pub async fn universe_id_of(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT t.universe_id FROM scenes s
             JOIN timelines t ON t.id = s.timeline_id
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// A timeline's scenes in ascending order, with association ids.
    pub async fn list_by_timeline(
        pool: &PgPool,
        timeline_id: DbId,
    ) -> Result<Vec<SceneWithRelations>, sqlx::Error> {
        let query = format!(
            "SELECT {S_COLUMNS}, {RELATION_COLUMNS}
             FROM scenes s
             WHERE s.timeline_id = $1
             ORDER BY s.\"order\" ASC, s.id ASC"
        );
        sqlx::query_as::<_, SceneWithRelations>(&query)
            .bind(timeline_id)
            .fetch_all(pool)
            .await
    }

    /// Every scene of a universe, grouped by timeline, for graph views.
    pub async fn list_by_universe(
        pool: &PgPool,
        universe_id: DbId,
    ) -> Result<Vec<SceneWithRelations>, sqlx::Error> {
        let query = format!(
            "SELECT {S_COLUMNS}, {RELATION_COLUMNS}
             FROM scenes s
             JOIN timelines t ON t.id = s.timeline_id
             WHERE t.universe_id = $1
             ORDER BY s.timeline_id ASC, s.\"order\" ASC, s.id ASC"
        );
        sqlx::query_as::<_, SceneWithRelations>(&query)
            .bind(universe_id)
            .fetch_all(pool)
            .await
    }

    /// The `(id, order)` pairs of a timeline, unsorted.
    pub async fn slots(pool: &PgPool, timeline_id: DbId) -> Result<Vec<SceneSlot>, sqlx::Error> {
        let rows: Vec<(DbId, i32)> =
            sqlx::query_as("SELECT id, \"order\" FROM scenes WHERE timeline_id = $1")
                .bind(timeline_id)
                .fetch_all(pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, order)| SceneSlot { id, order })
            .collect())
    }

    /// The scenes immediately before and after `scene` in its timeline.
    pub async fn neighbors(
        pool: &PgPool,
        scene: &Scene,
    ) -> Result<(Option<SceneRef>, Option<SceneRef>), sqlx::Error> {
        let previous = sqlx::query_as::<_, SceneRef>(
            "SELECT id, title, \"order\" FROM scenes
             WHERE timeline_id = $1 AND (\"order\" < $2 OR (\"order\" = $2 AND id < $3))
             ORDER BY \"order\" DESC, id DESC
             LIMIT 1",
        )
        .bind(scene.timeline_id)
        .bind(scene.order)
        .bind(scene.id)
        .fetch_optional(pool)
        .await?;

        let next = sqlx::query_as::<_, SceneRef>(
            "SELECT id, title, \"order\" FROM scenes
             WHERE timeline_id = $1 AND (\"order\" > $2 OR (\"order\" = $2 AND id > $3))
             ORDER BY \"order\" ASC, id ASC
             LIMIT 1",
        )
        .bind(scene.timeline_id)
        .bind(scene.order)
        .bind(scene.id)
        .fetch_optional(pool)
        .await?;

        Ok((previous, next))
    }

    /// Update a scene. Only non-`None` fields in `input` are applied; the
    /// word count follows the content and association lists replace the
    /// current set when present.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateScene,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let word_count = input
            .content
            .as_ref()
            .map(|content| content.as_deref().map_or(0, content_word_count));

        // Nullable columns bind a "provided" flag followed by the new value.
        let query = format!(
            "UPDATE scenes SET
                title = COALESCE($2, title),
                content = CASE WHEN $3 THEN $4 ELSE content END,
                summary = CASE WHEN $5 THEN $6 ELSE summary END,
                date = CASE WHEN $7 THEN $8 ELSE date END,
                time = CASE WHEN $9 THEN $10 ELSE time END,
                location = CASE WHEN $11 THEN $12 ELSE location END,
                mood = CASE WHEN $13 THEN $14 ELSE mood END,
                pov = CASE WHEN $15 THEN $16 ELSE pov END,
                is_branch_point = COALESCE($17, is_branch_point),
                branch_question = CASE WHEN $18 THEN $19 ELSE branch_question END,
                word_count = COALESCE($20, word_count)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let scene = sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.content.is_some())
            .bind(input.content.as_ref().and_then(|v| v.as_deref()))
            .bind(input.summary.is_some())
            .bind(input.summary.as_ref().and_then(|v| v.as_deref()))
            .bind(input.date.is_some())
            .bind(input.date.as_ref().and_then(|v| v.as_deref()))
            .bind(input.time.is_some())
            .bind(input.time.as_ref().and_then(|v| v.as_deref()))
            .bind(input.location.is_some())
            .bind(input.location.as_ref().and_then(|v| v.as_deref()))
            .bind(input.mood.is_some())
            .bind(input.mood.as_ref().and_then(|v| v.as_deref()))
            .bind(input.pov.is_some())
            .bind(input.pov.as_ref().and_then(|v| v.as_deref()))
            .bind(input.is_branch_point)
            .bind(input.branch_question.is_some())
            .bind(input.branch_question.as_ref().and_then(|v| v.as_deref()))
            .bind(word_count)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(ref scene) = scene {
            if let Some(ref ids) = input.character_ids {
                Self::sync_characters_inner(&mut tx, scene.id, ids).await?;
            }
            if let Some(ref ids) = input.tag_ids {
                Self::sync_tags_inner(&mut tx, scene.id, ids).await?;
            }
        }

        tx.commit().await?;
        Ok(scene)
    }

    /// Set or clear the branch-point flag and its question.
    pub async fn set_branch_point(
        pool: &PgPool,
        id: DbId,
        is_branch_point: bool,
        branch_question: Option<&str>,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET is_branch_point = $2, branch_question = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(is_branch_point)
            .bind(branch_question)
            .fetch_optional(pool)
            .await
    }

    /// Delete a scene and close the gap it leaves in its timeline.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let timeline_id: Option<DbId> =
            sqlx::query_scalar("DELETE FROM scenes WHERE id = $1 RETURNING timeline_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(timeline_id) = timeline_id else {
            return Ok(false);
        };

        let rows: Vec<(DbId, i32)> = sqlx::query_as(
            "SELECT id, \"order\" FROM scenes WHERE timeline_id = $1 FOR UPDATE",
        )
        .bind(timeline_id)
        .fetch_all(&mut *tx)
        .await?;
        let slots: Vec<SceneSlot> = rows
            .into_iter()
            .map(|(id, order)| SceneSlot { id, order })
            .collect();
        Self::apply_orders_inner(&mut tx, timeline_id, &renumber(&slots)).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Write new orders for a timeline's scenes in one transaction.
    pub async fn apply_orders(
        pool: &PgPool,
        timeline_id: DbId,
        assignments: &[OrderAssignment],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::apply_orders_inner(&mut tx, timeline_id, assignments).await?;
        tx.commit().await
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Search a universe's scenes. Every filter is optional; tag and
    /// character filters match scenes carrying any of the given ids.
    pub async fn search(
        pool: &PgPool,
        universe_id: DbId,
        params: &SceneSearchParams,
    ) -> Result<Vec<SceneSearchRow>, sqlx::Error> {
        let limit = clamp_limit(params.limit, MAX_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
        let sort = SortField::parse(params.sort.as_deref());
        let direction = SortDirection::parse(params.sort_dir.as_deref());
        let query_text = params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        // $1 is the universe id.
        let mut conditions = vec!["t.universe_id = $1".to_string()];
        let mut bind_idx = 2u32;

        if query_text.is_some() {
            conditions.push(format!(
                "(s.title ILIKE ${bind_idx} OR s.content ILIKE ${bind_idx} \
                  OR s.summary ILIKE ${bind_idx} OR s.location ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if !params.tag_ids.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM scene_tags fst \
                         WHERE fst.scene_id = s.id AND fst.tag_id = ANY(${bind_idx}))"
            ));
            bind_idx += 1;
        }
        if !params.character_ids.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM scene_characters fsc \
                         WHERE fsc.scene_id = s.id AND fsc.character_id = ANY(${bind_idx}))"
            ));
            bind_idx += 1;
        }
        if params.mood.is_some() {
            conditions.push(format!("s.mood = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.timeline_id.is_some() {
            conditions.push(format!("s.timeline_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let query = format!(
            "SELECT {S_COLUMNS}, t.name AS timeline_name, t.color AS timeline_color, \
                {RELATION_COLUMNS} \
             FROM scenes s \
             JOIN timelines t ON t.id = s.timeline_id \
             WHERE {conditions} \
             ORDER BY {column} {direction} NULLS LAST, s.id ASC \
             LIMIT ${bind_idx}",
            conditions = conditions.join(" AND "),
            column = sort.column(),
            direction = direction.sql(),
        );

        let mut q = sqlx::query_as::<_, SceneSearchRow>(&query).bind(universe_id);

        // Bind dynamic parameters in order.
        if let Some(text) = query_text {
            q = q.bind(like_pattern(text));
        }
        if !params.tag_ids.is_empty() {
            q = q.bind(&params.tag_ids);
        }
        if !params.character_ids.is_empty() {
            q = q.bind(&params.character_ids);
        }
        if let Some(ref mood) = params.mood {
            q = q.bind(mood);
        }
        if let Some(timeline_id) = params.timeline_id {
            q = q.bind(timeline_id);
        }

        q.bind(limit).fetch_all(pool).await
    }

    /// Distinct non-null moods used in a universe, alphabetically.
    pub async fn distinct_moods(pool: &PgPool, universe_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT s.mood FROM scenes s
             JOIN timelines t ON t.id = s.timeline_id
             WHERE t.universe_id = $1 AND s.mood IS NOT NULL AND s.mood <> ''
             ORDER BY s.mood",
        )
        .bind(universe_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Transaction helpers
    // -----------------------------------------------------------------------

    /// Insert a fully specified scene inside an open transaction. Used by
    /// branch copy, fork and import, which assign orders themselves.
    pub(crate) async fn insert_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        timeline_id: DbId,
        order: i32,
        scene: &SceneFields<'_>,
    ) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes (timeline_id, title, content, summary, \"order\", date, time, \
                location, mood, pov, is_branch_point, branch_question, word_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(timeline_id)
            .bind(scene.title)
            .bind(scene.content)
            .bind(scene.summary)
            .bind(order)
            .bind(scene.date)
            .bind(scene.time)
            .bind(scene.location)
            .bind(scene.mood)
            .bind(scene.pov)
            .bind(scene.is_branch_point)
            .bind(scene.branch_question)
            .bind(scene.word_count)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn apply_orders_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        timeline_id: DbId,
        assignments: &[OrderAssignment],
    ) -> Result<(), sqlx::Error> {
        for assignment in assignments {
            sqlx::query("UPDATE scenes SET \"order\" = $3 WHERE id = $1 AND timeline_id = $2")
                .bind(assignment.scene_id)
                .bind(timeline_id)
                .bind(assignment.order)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    /// Give `to_scene` the same characters and tags as `from_scene`.
    pub(crate) async fn copy_associations_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        from_scene: DbId,
        to_scene: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scene_characters (scene_id, character_id)
             SELECT $2, character_id FROM scene_characters WHERE scene_id = $1",
        )
        .bind(from_scene)
        .bind(to_scene)
        .execute(&mut **tx)
        .await?;
        sqlx::query(
            "INSERT INTO scene_tags (scene_id, tag_id)
             SELECT $2, tag_id FROM scene_tags WHERE scene_id = $1",
        )
        .bind(from_scene)
        .bind(to_scene)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Replace a scene's character set.
    pub(crate) async fn sync_characters_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        scene_id: DbId,
        character_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_characters WHERE scene_id = $1")
            .bind(scene_id)
            .execute(&mut **tx)
            .await?;
        if !character_ids.is_empty() {
            sqlx::query(
                "INSERT INTO scene_characters (scene_id, character_id)
                 SELECT $1, UNNEST($2::bigint[])
                 ON CONFLICT DO NOTHING",
            )
            .bind(scene_id)
            .bind(character_ids)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Replace a scene's tag set.
    pub(crate) async fn sync_tags_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        scene_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_tags WHERE scene_id = $1")
            .bind(scene_id)
            .execute(&mut **tx)
            .await?;
        if !tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO scene_tags (scene_id, tag_id)
                 SELECT $1, UNNEST($2::bigint[])
                 ON CONFLICT DO NOTHING",
            )
            .bind(scene_id)
            .bind(tag_ids)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

/// Borrowed column values for [`SceneRepo::insert_inner`].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SceneFields<'a> {
    pub title: &'a str,
    pub content: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub date: Option<&'a str>,
    pub time: Option<&'a str>,
    pub location: Option<&'a str>,
    pub mood: Option<&'a str>,
    pub pov: Option<&'a str>,
    pub is_branch_point: bool,
    pub branch_question: Option<&'a str>,
    pub word_count: i32,
}

impl<'a> SceneFields<'a> {
    /// Every column of an existing scene.
    pub(crate) fn of(scene: &'a Scene) -> Self {
        Self {
            title: &scene.title,
            content: scene.content.as_deref(),
            summary: scene.summary.as_deref(),
            date: scene.date.as_deref(),
            time: scene.time.as_deref(),
            location: scene.location.as_deref(),
            mood: scene.mood.as_deref(),
            pov: scene.pov.as_deref(),
            is_branch_point: scene.is_branch_point,
            branch_question: scene.branch_question.as_deref(),
            word_count: scene.word_count,
        }
    }
}
