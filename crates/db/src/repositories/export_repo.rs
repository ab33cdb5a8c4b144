//! Loading export documents. Associations are resolved to names.

use sqlx::{FromRow, PgPool};
use storyverse_core::export::{
    CharacterExport, SceneExport, TagExport, TimelineExport, UniverseExport, UniverseInfo,
};
use storyverse_core::types::DbId;

use crate::models::character::Character;
use crate::models::scene::Scene;
use crate::models::tag::Tag;
use crate::models::timeline::Timeline;
use crate::models::universe::Universe;

/// Scene columns plus association names, for the scene aliased `s`.
const SCENE_EXPORT_SELECT: &str = "\
    SELECT s.id, s.timeline_id, s.title, s.content, s.summary, s.\"order\", s.date, s.time, \
        s.location, s.mood, s.pov, s.is_branch_point, s.branch_question, s.word_count, \
        s.created_at, s.updated_at, \
        ARRAY(SELECT c.name FROM scene_characters sc JOIN characters c ON c.id = sc.character_id \
              WHERE sc.scene_id = s.id ORDER BY c.name) AS character_names, \
        ARRAY(SELECT t.name FROM scene_tags st JOIN tags t ON t.id = st.tag_id \
              WHERE st.scene_id = s.id ORDER BY t.name) AS tag_names \
    FROM scenes s";

#[derive(Debug, FromRow)]
struct SceneExportRow {
    #[sqlx(flatten)]
    scene: Scene,
    character_names: Vec<String>,
    tag_names: Vec<String>,
}

impl From<SceneExportRow> for SceneExport {
    fn from(row: SceneExportRow) -> Self {
        let scene = row.scene;
        Self {
            title: scene.title,
            content: scene.content,
            summary: scene.summary,
            order: scene.order,
            date: scene.date,
            time: scene.time,
            location: scene.location,
            mood: scene.mood,
            pov: scene.pov,
            is_branch_point: scene.is_branch_point,
            branch_question: scene.branch_question,
            characters: row.character_names,
            tags: row.tag_names,
        }
    }
}

pub struct ExportRepo;

impl ExportRepo {
    /// Everything in a universe: characters by name, tags by category and
    /// name, timelines canon first with their scenes ascending.
    pub async fn universe(pool: &PgPool, universe: &Universe) -> Result<UniverseExport, sqlx::Error> {
        let characters: Vec<Character> = sqlx::query_as(
            "SELECT id, universe_id, name, nickname, type, description, traits, avatar_url, color,
                COALESCE(NULLIF(nickname, ''), name) AS display_name, created_at, updated_at
             FROM characters WHERE universe_id = $1
             ORDER BY name, id",
        )
        .bind(universe.id)
        .fetch_all(pool)
        .await?;

        let tags: Vec<Tag> = sqlx::query_as(
            "SELECT id, universe_id, name, color, category, created_at, updated_at
             FROM tags WHERE universe_id = $1
             ORDER BY category, name, id",
        )
        .bind(universe.id)
        .fetch_all(pool)
        .await?;

        let timelines: Vec<Timeline> = sqlx::query_as(
            "SELECT id, universe_id, name, description, color, is_canon, branch_from_id, created_at, updated_at
             FROM timelines WHERE universe_id = $1
             ORDER BY is_canon DESC, name, id",
        )
        .bind(universe.id)
        .fetch_all(pool)
        .await?;

        let mut timeline_exports = Vec::with_capacity(timelines.len());
        for timeline in timelines {
            timeline_exports.push(Self::timeline(pool, timeline).await?);
        }

        Ok(UniverseExport {
            universe: UniverseInfo {
                name: universe.name.clone(),
                description: universe.description.clone(),
                is_public: universe.is_public,
                allow_fork: universe.allow_fork,
                created_at: universe.created_at,
            },
            characters: characters
                .into_iter()
                .map(|c| CharacterExport {
                    name: c.name,
                    nickname: c.nickname,
                    kind: c.kind,
                    description: c.description,
                    traits: c.traits.0,
                    color: c.color,
                })
                .collect(),
            tags: tags
                .into_iter()
                .map(|t| TagExport {
                    name: t.name,
                    color: t.color,
                    category: t.category,
                })
                .collect(),
            timelines: timeline_exports,
        })
    }

    /// A timeline with its scenes in ascending order.
    pub async fn timeline(pool: &PgPool, timeline: Timeline) -> Result<TimelineExport, sqlx::Error> {
        let query = format!(
            "{SCENE_EXPORT_SELECT} WHERE s.timeline_id = $1 ORDER BY s.\"order\" ASC, s.id ASC"
        );
        let rows: Vec<SceneExportRow> = sqlx::query_as(&query)
            .bind(timeline.id)
            .fetch_all(pool)
            .await?;

        Ok(TimelineExport {
            name: timeline.name,
            description: timeline.description,
            color: timeline.color,
            is_canon: timeline.is_canon,
            scenes: rows.into_iter().map(SceneExport::from).collect(),
        })
    }

    /// A single scene, or `None` if it does not exist.
    pub async fn scene(pool: &PgPool, scene_id: DbId) -> Result<Option<SceneExport>, sqlx::Error> {
        let query = format!("{SCENE_EXPORT_SELECT} WHERE s.id = $1");
        let row: Option<SceneExportRow> = sqlx::query_as(&query)
            .bind(scene_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(SceneExport::from))
    }
}
