//! Scene entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyverse_core::types::{DbId, Timestamp};
use storyverse_core::validation::{
    validate_hex_color, validate_not_blank, MAX_BRANCH_QUESTION_LENGTH, MAX_CONTENT_LENGTH,
    MAX_DESCRIPTION_LENGTH, MAX_LABEL_LENGTH, MAX_NAME_LENGTH, MAX_SUMMARY_LENGTH,
};
use validator::Validate;

/// A scene row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: DbId,
    pub timeline_id: DbId,
    pub title: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    /// 1-based position within the timeline.
    pub order: i32,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub mood: Option<String>,
    pub pov: Option<String>,
    pub is_branch_point: bool,
    pub branch_question: Option<String>,
    pub word_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A scene with the ids of its associated characters and tags.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SceneWithRelations {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub scene: Scene,
    pub character_ids: Vec<DbId>,
    pub tag_ids: Vec<DbId>,
}

/// A search hit: the scene, its timeline label and association ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SceneSearchRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub scene: Scene,
    pub timeline_name: String,
    pub timeline_color: String,
    pub character_ids: Vec<DbId>,
    pub tag_ids: Vec<DbId>,
}

/// Minimal reference to an adjacent scene.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SceneRef {
    pub id: DbId,
    pub title: String,
    pub order: i32,
}

/// Filters accepted by scene search. Sort values are resolved through the
/// allow-lists in `storyverse_core::search`.
#[derive(Debug, Clone, Default)]
pub struct SceneSearchParams {
    pub query: Option<String>,
    pub tag_ids: Vec<DbId>,
    pub character_ids: Vec<DbId>,
    pub mood: Option<String>,
    pub timeline_id: Option<DbId>,
    pub sort: Option<String>,
    pub sort_dir: Option<String>,
    pub limit: Option<i64>,
}

/// DTO for creating a new scene. The order is always appended.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateScene {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(length(max = MAX_CONTENT_LENGTH))]
    pub content: Option<String>,
    #[validate(length(max = MAX_SUMMARY_LENGTH))]
    pub summary: Option<String>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub date: Option<String>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub time: Option<String>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub location: Option<String>,
    #[validate(length(max = MAX_LABEL_LENGTH))]
    pub mood: Option<String>,
    #[validate(length(max = MAX_LABEL_LENGTH))]
    pub pov: Option<String>,
    pub is_branch_point: Option<bool>,
    #[validate(length(max = MAX_BRANCH_QUESTION_LENGTH))]
    pub branch_question: Option<String>,
    pub character_ids: Option<Vec<DbId>>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// DTO for updating an existing scene. All fields are optional; association
/// lists replace the current set when present. `null` clears a nullable
/// column.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateScene {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(length(max = MAX_CONTENT_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub content: Option<Option<String>>,
    #[validate(length(max = MAX_SUMMARY_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub summary: Option<Option<String>>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub date: Option<Option<String>>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub time: Option<Option<String>>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub location: Option<Option<String>>,
    #[validate(length(max = MAX_LABEL_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub mood: Option<Option<String>>,
    #[validate(length(max = MAX_LABEL_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub pov: Option<Option<String>>,
    pub is_branch_point: Option<bool>,
    #[validate(length(max = MAX_BRANCH_QUESTION_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub branch_question: Option<Option<String>>,
    pub character_ids: Option<Vec<DbId>>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// New order of a timeline's scenes, first to last.
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderScenes {
    pub scene_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleBranchPoint {
    pub is_branch_point: bool,
    #[validate(length(max = MAX_BRANCH_QUESTION_LENGTH))]
    pub branch_question: Option<String>,
}

/// DTO for branching a new timeline off a scene.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateBranch {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    /// Defaults to `#F59E0B`.
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[serde(default)]
    pub copy_subsequent_scenes: bool,
}
