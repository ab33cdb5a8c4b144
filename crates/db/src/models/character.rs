//! Character entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use storyverse_core::types::{DbId, Timestamp};
use storyverse_core::validation::{
    validate_hex_color, validate_not_blank, validate_traits, MAX_CHARACTER_DESCRIPTION_LENGTH,
    MAX_NAME_LENGTH, MAX_TYPE_LENGTH, MAX_URL_LENGTH,
};
use validator::Validate;

/// A character row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub universe_id: DbId,
    pub name: String,
    pub nickname: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    /// JSONB array of strings.
    pub traits: Json<Vec<String>>,
    pub avatar_url: Option<String>,
    pub color: Option<String>,
    /// The nickname, or the name when there is none. Computed in SQL.
    pub display_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A scene the character appears in, labelled with its timeline.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CharacterAppearance {
    pub scene_id: DbId,
    pub title: String,
    pub order: i32,
    pub timeline_id: DbId,
    pub timeline_name: String,
}

/// A character with the number of scenes it appears in.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CharacterWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub character: Character,
    pub scenes_count: i64,
}

/// DTO for creating a new character.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateCharacter {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub nickname: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = MAX_TYPE_LENGTH))]
    pub kind: Option<String>,
    #[validate(length(max = MAX_CHARACTER_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_traits"))]
    pub traits: Option<Vec<String>>,
    #[validate(length(max = MAX_URL_LENGTH))]
    pub avatar_url: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// DTO for updating an existing character. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCharacter {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub nickname: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = MAX_TYPE_LENGTH))]
    pub kind: Option<String>,
    #[validate(length(max = MAX_CHARACTER_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_traits"))]
    pub traits: Option<Vec<String>>,
    #[validate(length(max = MAX_URL_LENGTH))]
    pub avatar_url: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}
