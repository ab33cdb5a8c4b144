//! Text-import DTOs and results.

use serde::{Deserialize, Serialize};
use storyverse_core::validation::{
    validate_hex_color, validate_not_blank, MAX_CONTENT_LENGTH, MAX_IMPORT_DESCRIPTION_LENGTH,
    MAX_NAME_LENGTH,
};
use validator::Validate;

use crate::models::timeline::Timeline;

/// Default timeline name offered by the preview.
pub const DEFAULT_IMPORT_TIMELINE_NAME: &str = "Imported Timeline";

/// Raw text to preview or analyse.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImportContent {
    #[validate(
        length(min = 1, max = MAX_CONTENT_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
}

/// Raw text to commit as a new timeline.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(
        length(min = 1, max = MAX_CONTENT_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub timeline_name: String,
    #[validate(length(max = MAX_IMPORT_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    /// Defaults to `#1CB0F6`.
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[serde(default)]
    pub is_canon: bool,
    #[serde(default = "default_true")]
    pub create_characters: bool,
    #[serde(default = "default_true")]
    pub create_tags: bool,
}

fn default_true() -> bool {
    true
}

/// What a committed import created.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub timeline: Timeline,
    pub scenes_count: usize,
    /// Characters attached to at least one scene, reused or new.
    pub characters_count: usize,
    /// Tags attached to at least one scene, reused or new.
    pub tags_count: usize,
}
