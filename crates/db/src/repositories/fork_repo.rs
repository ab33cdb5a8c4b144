//! Deep copy of a universe into a new private universe.

use std::collections::HashMap;

use sqlx::PgPool;
use storyverse_core::types::DbId;

use crate::models::character::Character;
use crate::models::scene::Scene;
use crate::models::tag::Tag;
use crate::models::timeline::Timeline;
use crate::models::universe::Universe;
use crate::repositories::character_repo::CharacterFields;
use crate::repositories::scene_repo::SceneFields;
use crate::repositories::{CharacterRepo, SceneRepo, TagRepo, TimelineRepo};

const UNIVERSE_COLUMNS: &str = "id, user_id, name, description, cover_image, is_public, allow_fork, \
                                forked_from_id, fork_count, created_at, updated_at";

pub struct ForkRepo;

impl ForkRepo {
    /// Clone `source` with every timeline, character, tag, scene and scene
    /// link into a universe owned by `user_id`, then bump the source's
    /// fork count. Branch origins are remapped onto the cloned scenes.
    pub async fn fork(
        pool: &PgPool,
        source: &Universe,
        user_id: DbId,
    ) -> Result<Universe, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO universes (user_id, name, description, cover_image, is_public, allow_fork, forked_from_id)
             VALUES ($1, $2, $3, $4, false, false, $5)
             RETURNING {UNIVERSE_COLUMNS}"
        );
        let fork = sqlx::query_as::<_, Universe>(&query)
            .bind(user_id)
            .bind(format!("{} (Fork)", source.name))
            .bind(&source.description)
            .bind(&source.cover_image)
            .bind(source.id)
            .fetch_one(&mut *tx)
            .await?;

        // ── Timelines ──
        let timelines: Vec<Timeline> = sqlx::query_as(
            "SELECT id, universe_id, name, description, color, is_canon, branch_from_id, created_at, updated_at
             FROM timelines WHERE universe_id = $1 ORDER BY id",
        )
        .bind(source.id)
        .fetch_all(&mut *tx)
        .await?;
        let mut timeline_map: HashMap<DbId, DbId> = HashMap::with_capacity(timelines.len());
        for timeline in &timelines {
            let clone = TimelineRepo::insert_inner(
                &mut tx,
                fork.id,
                &timeline.name,
                timeline.description.as_deref(),
                &timeline.color,
                timeline.is_canon,
                None,
            )
            .await?;
            timeline_map.insert(timeline.id, clone.id);
        }

        // ── Characters ──
        let characters: Vec<Character> = sqlx::query_as(
            "SELECT id, universe_id, name, nickname, type, description, traits, avatar_url, color,
                COALESCE(NULLIF(nickname, ''), name) AS display_name, created_at, updated_at
             FROM characters WHERE universe_id = $1 ORDER BY id",
        )
        .bind(source.id)
        .fetch_all(&mut *tx)
        .await?;
        let mut character_map: HashMap<DbId, DbId> = HashMap::with_capacity(characters.len());
        for character in &characters {
            let id =
                CharacterRepo::insert_inner(&mut tx, fork.id, &CharacterFields::of(character))
                    .await?;
            character_map.insert(character.id, id);
        }

        // ── Tags ──
        let tags: Vec<Tag> = sqlx::query_as(
            "SELECT id, universe_id, name, color, category, created_at, updated_at
             FROM tags WHERE universe_id = $1 ORDER BY id",
        )
        .bind(source.id)
        .fetch_all(&mut *tx)
        .await?;
        let mut tag_map: HashMap<DbId, DbId> = HashMap::with_capacity(tags.len());
        for tag in &tags {
            let id = TagRepo::insert_inner(
                &mut tx,
                fork.id,
                &tag.name,
                tag.color.as_deref(),
                &tag.category,
            )
            .await?;
            tag_map.insert(tag.id, id);
        }

        // ── Scenes ──
        let scenes: Vec<Scene> = sqlx::query_as(
            "SELECT s.id, s.timeline_id, s.title, s.content, s.summary, s.\"order\", s.date, s.time,
                s.location, s.mood, s.pov, s.is_branch_point, s.branch_question, s.word_count,
                s.created_at, s.updated_at
             FROM scenes s
             JOIN timelines t ON t.id = s.timeline_id
             WHERE t.universe_id = $1
             ORDER BY s.timeline_id, s.\"order\", s.id",
        )
        .bind(source.id)
        .fetch_all(&mut *tx)
        .await?;
        let mut scene_map: HashMap<DbId, DbId> = HashMap::with_capacity(scenes.len());
        for scene in &scenes {
            let Some(&timeline_id) = timeline_map.get(&scene.timeline_id) else {
                continue;
            };
            let clone =
                SceneRepo::insert_inner(&mut tx, timeline_id, scene.order, &SceneFields::of(scene))
                    .await?;
            scene_map.insert(scene.id, clone.id);
        }

        // ── Scene links ──
        let character_links: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT sc.scene_id, sc.character_id
             FROM scene_characters sc
             JOIN scenes s ON s.id = sc.scene_id
             JOIN timelines t ON t.id = s.timeline_id
             WHERE t.universe_id = $1",
        )
        .bind(source.id)
        .fetch_all(&mut *tx)
        .await?;
        let (scene_ids, character_ids) = remap_pairs(&character_links, &scene_map, &character_map);
        sqlx::query(
            "INSERT INTO scene_characters (scene_id, character_id)
             SELECT * FROM UNNEST($1::bigint[], $2::bigint[])
             ON CONFLICT DO NOTHING",
        )
        .bind(&scene_ids)
        .bind(&character_ids)
        .execute(&mut *tx)
        .await?;

        let tag_links: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT st.scene_id, st.tag_id
             FROM scene_tags st
             JOIN scenes s ON s.id = st.scene_id
             JOIN timelines t ON t.id = s.timeline_id
             WHERE t.universe_id = $1",
        )
        .bind(source.id)
        .fetch_all(&mut *tx)
        .await?;
        let (scene_ids, tag_ids) = remap_pairs(&tag_links, &scene_map, &tag_map);
        sqlx::query(
            "INSERT INTO scene_tags (scene_id, tag_id)
             SELECT * FROM UNNEST($1::bigint[], $2::bigint[])
             ON CONFLICT DO NOTHING",
        )
        .bind(&scene_ids)
        .bind(&tag_ids)
        .execute(&mut *tx)
        .await?;

        // ── Branch origins ──
        for timeline in &timelines {
            let (Some(&clone_id), Some(origin)) =
                (timeline_map.get(&timeline.id), timeline.branch_from_id)
            else {
                continue;
            };
            // Origins outside the universe have no clone and are dropped.
            if let Some(&scene_id) = scene_map.get(&origin) {
                sqlx::query("UPDATE timelines SET branch_from_id = $2 WHERE id = $1")
                    .bind(clone_id)
                    .bind(scene_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("UPDATE universes SET fork_count = fork_count + 1 WHERE id = $1")
            .bind(source.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(
            source_id = source.id,
            fork_id = fork.id,
            user_id,
            timelines = timeline_map.len(),
            scenes = scene_map.len(),
            "Universe forked"
        );
        Ok(fork)
    }
}

/// Map `(scene, other)` pairs through both id maps into parallel arrays for
/// an `UNNEST` insert. Pairs with an unmapped side are dropped.
fn remap_pairs(
    pairs: &[(DbId, DbId)],
    scenes: &HashMap<DbId, DbId>,
    others: &HashMap<DbId, DbId>,
) -> (Vec<DbId>, Vec<DbId>) {
    pairs
        .iter()
        .filter_map(|(scene, other)| Some((*scenes.get(scene)?, *others.get(other)?)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_pairs_drops_unmapped_sides() {
        let scenes = HashMap::from([(1, 10), (2, 20)]);
        let others = HashMap::from([(7, 70)]);
        let (s, o) = remap_pairs(&[(1, 7), (2, 8), (3, 7)], &scenes, &others);
        assert_eq!(s, vec![10]);
        assert_eq!(o, vec![70]);
    }
}
