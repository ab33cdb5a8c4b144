//! Committing parsed text as a new timeline.

use std::collections::{BTreeMap, HashMap, HashSet};

use sqlx::PgPool;
use storyverse_core::branching::DEFAULT_TIMELINE_COLOR;
use storyverse_core::importer::text_parser::{imported_tag_category, palette_color};
use storyverse_core::importer::ParsedScene;
use storyverse_core::text::content_word_count;
use storyverse_core::types::DbId;

use crate::models::import::{ImportRequest, ImportResult};
use crate::repositories::character_repo::CharacterFields;
use crate::repositories::scene_repo::SceneFields;
use crate::repositories::{CharacterRepo, SceneRepo, TagRepo, TimelineRepo};

pub struct ImportRepo;

impl ImportRepo {
    /// Persist `scenes` into a new timeline of the universe, reusing
    /// characters by exact name and tags by case-insensitive name.
    ///
    /// Everything happens in one transaction.
    pub async fn commit(
        pool: &PgPool,
        universe_id: DbId,
        request: &ImportRequest,
        scenes: &[ParsedScene],
    ) -> Result<ImportResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if request.is_canon {
            TimelineRepo::unset_canon_inner(&mut tx, universe_id, None).await?;
        }
        let timeline = TimelineRepo::insert_inner(
            &mut tx,
            universe_id,
            &request.timeline_name,
            request.description.as_deref(),
            request.color.as_deref().unwrap_or(DEFAULT_TIMELINE_COLOR),
            request.is_canon,
            None,
        )
        .await?;

        // ── Characters ──
        let mut characters: BTreeMap<&str, DbId> = BTreeMap::new();
        if request.create_characters {
            let mut created = 0;
            for name in scenes.iter().flat_map(|s| s.characters.iter()) {
                if characters.contains_key(name.as_str()) {
                    continue;
                }
                let existing: Option<DbId> = sqlx::query_scalar(
                    "SELECT id FROM characters WHERE universe_id = $1 AND name = $2
                     ORDER BY id LIMIT 1",
                )
                .bind(universe_id)
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;
                let id = match existing {
                    Some(id) => id,
                    None => {
                        let fields = CharacterFields {
                            name: name.as_str(),
                            kind: Some(name.as_str()),
                            color: Some(palette_color(created)),
                            ..CharacterFields::default()
                        };
                        created += 1;
                        CharacterRepo::insert_inner(&mut tx, universe_id, &fields).await?
                    }
                };
                characters.insert(name.as_str(), id);
            }
        }

        // ── Tags ──
        let mut tags: HashMap<String, DbId> = HashMap::new();
        let mut tags_created = 0;
        if request.create_tags {
            let existing: Vec<(DbId, String)> =
                sqlx::query_as("SELECT id, name FROM tags WHERE universe_id = $1 ORDER BY id")
                    .bind(universe_id)
                    .fetch_all(&mut *tx)
                    .await?;
            for (id, name) in existing {
                tags.entry(name.to_lowercase()).or_insert(id);
            }
            for name in scenes.iter().flat_map(|s| s.tags.iter()) {
                let key = name.to_lowercase();
                if tags.contains_key(&key) {
                    continue;
                }
                let category = imported_tag_category(name);
                let color = palette_color(tags_created);
                tags_created += 1;
                let id = TagRepo::insert_inner(
                    &mut tx,
                    universe_id,
                    name,
                    Some(color),
                    category.as_str(),
                )
                .await?;
                tags.insert(key, id);
            }
        }

        // ── Scenes ──
        let mut used_characters = HashSet::new();
        let mut used_tags = HashSet::new();
        for parsed in scenes {
            let fields = SceneFields {
                title: &parsed.title,
                content: Some(parsed.content.as_str()),
                summary: Some(parsed.summary.as_str()),
                date: parsed.date.as_deref(),
                location: parsed.location.as_deref(),
                mood: parsed.mood.as_deref(),
                is_branch_point: parsed.is_branch_point,
                word_count: content_word_count(&parsed.content),
                ..SceneFields::default()
            };
            let scene = SceneRepo::insert_inner(&mut tx, timeline.id, parsed.order, &fields).await?;

            let character_ids: Vec<DbId> = parsed
                .characters
                .iter()
                .filter_map(|name| characters.get(name.as_str()).copied())
                .collect();
            let tag_ids: Vec<DbId> = parsed
                .tags
                .iter()
                .filter_map(|name| tags.get(&name.to_lowercase()).copied())
                .collect();
            SceneRepo::sync_characters_inner(&mut tx, scene.id, &character_ids).await?;
            SceneRepo::sync_tags_inner(&mut tx, scene.id, &tag_ids).await?;
            used_characters.extend(character_ids);
            used_tags.extend(tag_ids);
        }

        tx.commit().await?;
        tracing::info!(
            universe_id,
            timeline_id = timeline.id,
            scenes = scenes.len(),
            "Text import committed"
        );
        Ok(ImportResult {
            timeline,
            scenes_count: scenes.len(),
            characters_count: used_characters.len(),
            tags_count: used_tags.len(),
        })
    }
}
