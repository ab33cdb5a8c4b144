//! Tag entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyverse_core::types::{DbId, Timestamp};
use storyverse_core::validation::{
    validate_hex_color, validate_not_blank, validate_tag_category, MAX_TAG_NAME_LENGTH,
};
use validator::Validate;

/// A tag row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub universe_id: DbId,
    pub name: String,
    pub color: Option<String>,
    /// One of the closed set in `storyverse_core::validation::TagCategory`.
    pub category: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A tag with the number of scenes carrying it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tag: Tag,
    pub scenes_count: i64,
}

/// DTO for creating a new tag.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTag {
    #[validate(
        length(min = 1, max = MAX_TAG_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    /// Defaults to `other`.
    #[validate(custom(function = "validate_tag_category"))]
    pub category: Option<String>,
}

/// DTO for updating an existing tag. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTag {
    #[validate(
        length(min = 1, max = MAX_TAG_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[validate(custom(function = "validate_tag_category"))]
    pub category: Option<String>,
}

/// Find-or-create by exact name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuickCreateTag {
    #[validate(
        length(min = 1, max = MAX_TAG_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
}
