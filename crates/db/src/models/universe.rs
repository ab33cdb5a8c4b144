//! Universe entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyverse_core::access::UniverseAccess;
use storyverse_core::types::{DbId, Timestamp};
use storyverse_core::validation::{
    validate_not_blank, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_URL_LENGTH,
};
use validator::Validate;

/// A universe row from the `universes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Universe {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub is_public: bool,
    pub allow_fork: bool,
    pub forked_from_id: Option<DbId>,
    pub fork_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Universe {
    pub fn access(&self) -> UniverseAccess {
        UniverseAccess {
            owner_id: self.user_id,
            is_public: self.is_public,
            allow_fork: self.allow_fork,
        }
    }
}

/// A universe annotated with child counts, for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UniverseWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub universe: Universe,
    pub timelines_count: i64,
    pub characters_count: i64,
}

/// A public universe as listed on the explore page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExploreUniverse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub universe: Universe,
    pub owner_name: String,
    pub timelines_count: i64,
    pub characters_count: i64,
}

/// DTO for creating a new universe.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUniverse {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    #[validate(length(max = MAX_URL_LENGTH))]
    pub cover_image: Option<String>,
    pub is_public: Option<bool>,
    pub allow_fork: Option<bool>,
}

/// DTO for updating an existing universe. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUniverse {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    #[validate(length(max = MAX_URL_LENGTH))]
    pub cover_image: Option<String>,
    pub is_public: Option<bool>,
    pub allow_fork: Option<bool>,
}
