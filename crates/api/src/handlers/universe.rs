//! Handlers for the `/universes` resource, including forking.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use storyverse_core::types::DbId;
use storyverse_db::models::character::CharacterWithCount;
use storyverse_db::models::scene::SceneWithRelations;
use storyverse_db::models::tag::TagWithCount;
use storyverse_db::models::timeline::TimelineWithCounts;
use storyverse_db::models::universe::{CreateUniverse, Universe, UpdateUniverse};
use storyverse_db::repositories::{
    CharacterRepo, ForkRepo, SceneRepo, TagRepo, TimelineRepo, UniverseRepo,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A universe with everything needed to draw its branch graph.
#[derive(Debug, Serialize)]
pub struct UniverseDetail {
    #[serde(flatten)]
    pub universe: Universe,
    pub timelines: Vec<TimelineWithCounts>,
    pub characters: Vec<CharacterWithCount>,
    pub tags: Vec<TagWithCount>,
    /// Every scene of every timeline, with association ids.
    pub scenes: Vec<SceneWithRelations>,
    pub can_edit: bool,
    pub can_fork: bool,
}

/// GET /api/v1/universes
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let universes = UniverseRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: universes }))
}

/// POST /api/v1/universes
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateUniverse>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let universe = UniverseRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(universe_id = universe.id, user_id = auth.user_id, "Universe created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: universe })))
}

/// GET /api/v1/universes/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let universe = scope::universe(&state.pool, id, &auth, Access::View).await?;

    let timelines = TimelineRepo::list_by_universe(&state.pool, id).await?;
    let characters = CharacterRepo::list_by_universe(&state.pool, id).await?;
    let tags = TagRepo::list_by_universe(&state.pool, id).await?;
    let scenes = SceneRepo::list_by_universe(&state.pool, id).await?;

    let policy = universe.access();
    let detail = UniverseDetail {
        can_edit: policy.can_update(auth.user_id),
        can_fork: policy.can_fork(auth.user_id),
        universe,
        timelines,
        characters,
        tags,
        scenes,
    };
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/universes/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUniverse>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;

    let universe = UniverseRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Universe", id))?;

    tracing::info!(universe_id = id, user_id = auth.user_id, "Universe updated");

    Ok(Json(DataResponse { data: universe }))
}

/// DELETE /api/v1/universes/{id}
///
/// Cascades to timelines, scenes, characters and tags.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope::universe(&state.pool, id, &auth, Access::Delete).await?;

    if !UniverseRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Universe", id));
    }

    tracing::info!(universe_id = id, user_id = auth.user_id, "Universe deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/universes/{id}/fork
///
/// Deep-copy a public, forkable universe into the caller's account.
pub async fn fork(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let source = scope::find_universe(&state.pool, id).await?;
    source.access().ensure_fork(auth.user_id)?;

    let forked = ForkRepo::fork(&state.pool, &source, auth.user_id).await?;

    tracing::info!(
        universe_id = id,
        fork_id = forked.id,
        user_id = auth.user_id,
        "Universe forked"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: forked })))
}
