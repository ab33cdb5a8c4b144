//! Timeline entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyverse_core::types::{DbId, Timestamp};
use storyverse_core::validation::{
    validate_hex_color, validate_not_blank, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use validator::Validate;

/// A timeline row from the `timelines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Timeline {
    pub id: DbId,
    pub universe_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_canon: bool,
    /// The scene this timeline branched from, if any.
    pub branch_from_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A timeline with its scene count and the timeline of its branch origin.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimelineWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub timeline: Timeline,
    pub scenes_count: i64,
    pub branch_from_timeline_id: Option<DbId>,
}

/// DTO for creating a new timeline.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTimeline {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    /// Defaults to `#1CB0F6`.
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub is_canon: Option<bool>,
    pub branch_from_id: Option<DbId>,
}

/// DTO for updating an existing timeline. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTimeline {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub description: Option<Option<String>>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub is_canon: Option<bool>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub branch_from_id: Option<Option<DbId>>,
}
