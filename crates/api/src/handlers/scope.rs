//! Resolving an entity to its owning universe and applying the access policy.
//!
//! Every handler that touches a universe or one of its descendants loads it
//! through here, so the policy check happens before any write.

use std::collections::HashSet;

use sqlx::PgPool;
use storyverse_core::branching::ensure_same_universe;
use storyverse_core::error::CoreError;
use storyverse_core::types::DbId;
use storyverse_db::models::character::Character;
use storyverse_db::models::scene::Scene;
use storyverse_db::models::tag::Tag;
use storyverse_db::models::timeline::Timeline;
use storyverse_db::models::universe::Universe;
use storyverse_db::repositories::{
    CharacterRepo, SceneRepo, TagRepo, TimelineRepo, UniverseRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// What the caller intends to do with the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    View,
    Update,
    Delete,
}

pub fn authorize(universe: &Universe, user: &AuthUser, access: Access) -> Result<(), CoreError> {
    let policy = universe.access();
    match access {
        Access::View => policy.ensure_view(user.user_id),
        Access::Update => policy.ensure_update(user.user_id),
        Access::Delete => policy.ensure_delete(user.user_id),
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

pub async fn find_universe(pool: &PgPool, id: DbId) -> AppResult<Universe> {
    UniverseRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Universe", id))
}

pub async fn universe(
    pool: &PgPool,
    id: DbId,
    user: &AuthUser,
    access: Access,
) -> AppResult<Universe> {
    let universe = find_universe(pool, id).await?;
    authorize(&universe, user, access)?;
    Ok(universe)
}

pub async fn timeline(
    pool: &PgPool,
    id: DbId,
    user: &AuthUser,
    access: Access,
) -> AppResult<(Timeline, Universe)> {
    let timeline = TimelineRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Timeline", id))?;
    let universe = universe(pool, timeline.universe_id, user, access).await?;
    Ok((timeline, universe))
}

pub async fn scene(
    pool: &PgPool,
    id: DbId,
    user: &AuthUser,
    access: Access,
) -> AppResult<(Scene, Timeline, Universe)> {
    let scene = SceneRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Scene", id))?;
    let (timeline, universe) = timeline(pool, scene.timeline_id, user, access).await?;
    Ok((scene, timeline, universe))
}

pub async fn character(
    pool: &PgPool,
    id: DbId,
    user: &AuthUser,
    access: Access,
) -> AppResult<(Character, Universe)> {
    let character = CharacterRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Character", id))?;
    let universe = universe(pool, character.universe_id, user, access).await?;
    Ok((character, universe))
}

pub async fn tag(pool: &PgPool, id: DbId, user: &AuthUser, access: Access) -> AppResult<(Tag, Universe)> {
    let tag = TagRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Tag", id))?;
    let universe = universe(pool, tag.universe_id, user, access).await?;
    Ok((tag, universe))
}

// ---------------------------------------------------------------------------
// Cross-entity checks
// ---------------------------------------------------------------------------

/// Reject character or tag ids that do not belong to the universe.
pub async fn ensure_associations(
    pool: &PgPool,
    universe_id: DbId,
    character_ids: Option<&[DbId]>,
    tag_ids: Option<&[DbId]>,
) -> AppResult<()> {
    if let Some(ids) = character_ids.filter(|ids| !ids.is_empty()) {
        let found = CharacterRepo::count_in_universe(pool, universe_id, ids).await?;
        if found != distinct(ids) {
            return Err(CoreError::Validation(
                "character_ids: every character must belong to this universe".into(),
            )
            .into());
        }
    }
    if let Some(ids) = tag_ids.filter(|ids| !ids.is_empty()) {
        let found = TagRepo::count_in_universe(pool, universe_id, ids).await?;
        if found != distinct(ids) {
            return Err(CoreError::Validation(
                "tag_ids: every tag must belong to this universe".into(),
            )
            .into());
        }
    }
    Ok(())
}

/// A branch origin must be an existing scene of the same universe.
pub async fn ensure_branch_origin(
    pool: &PgPool,
    universe_id: DbId,
    branch_from_id: Option<DbId>,
) -> AppResult<()> {
    let Some(scene_id) = branch_from_id else {
        return Ok(());
    };
    let scene_universe = SceneRepo::universe_id_of(pool, scene_id)
        .await?
        .ok_or_else(|| {
            CoreError::Validation(format!("branch_from_id: scene {scene_id} does not exist"))
        })?;
    ensure_same_universe(universe_id, scene_universe)?;
    Ok(())
}

fn distinct(ids: &[DbId]) -> i64 {
    ids.iter().collect::<HashSet<_>>().len() as i64
}
