//! Handlers for scenes: timeline-scoped listing, creation and reordering;
//! show/update/delete, branch-point toggling and branching by id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use storyverse_core::ordering;
use storyverse_core::types::DbId;
use storyverse_db::models::character::Character;
use storyverse_db::models::scene::{
    CreateBranch, CreateScene, ReorderScenes, SceneRef, SceneWithRelations, ToggleBranchPoint,
    UpdateScene,
};
use storyverse_db::models::tag::Tag;
use storyverse_db::repositories::{BranchRepo, CharacterRepo, SceneRepo, TagRepo, TimelineRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A scene with its associations and neighbours in the timeline.
#[derive(Debug, Serialize)]
pub struct SceneDetail {
    #[serde(flatten)]
    pub scene: SceneWithRelations,
    pub characters: Vec<Character>,
    pub tags: Vec<Tag>,
    pub previous: Option<SceneRef>,
    pub next: Option<SceneRef>,
}

async fn load_with_relations(state: &AppState, id: DbId) -> AppResult<SceneWithRelations> {
    SceneRepo::find_with_relations(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Scene", id))
}

// ---------------------------------------------------------------------------
// Timeline-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/timelines/{id}/scenes
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(timeline_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    scope::timeline(&state.pool, timeline_id, &auth, Access::View).await?;
    let scenes = SceneRepo::list_by_timeline(&state.pool, timeline_id).await?;
    Ok(Json(DataResponse { data: scenes }))
}

/// POST /api/v1/timelines/{id}/scenes
///
/// The scene is appended after the current last one.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(timeline_id): Path<DbId>,
    Json(input): Json<CreateScene>,
) -> AppResult<impl IntoResponse> {
    let (_, universe) = scope::timeline(&state.pool, timeline_id, &auth, Access::Update).await?;
    input.validate()?;
    scope::ensure_associations(
        &state.pool,
        universe.id,
        input.character_ids.as_deref(),
        input.tag_ids.as_deref(),
    )
    .await?;

    let scene = SceneRepo::create(&state.pool, timeline_id, &input).await?;

    tracing::info!(
        scene_id = scene.scene.id,
        timeline_id,
        order = scene.scene.order,
        user_id = auth.user_id,
        "Scene created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: scene })))
}

/// POST /api/v1/timelines/{id}/scenes/reorder
///
/// `scene_ids` must list every scene of the timeline exactly once.
pub async fn reorder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(timeline_id): Path<DbId>,
    Json(input): Json<ReorderScenes>,
) -> AppResult<impl IntoResponse> {
    scope::timeline(&state.pool, timeline_id, &auth, Access::Update).await?;

    let existing: Vec<DbId> = SceneRepo::slots(&state.pool, timeline_id)
        .await?
        .into_iter()
        .map(|slot| slot.id)
        .collect();
    let assignments = ordering::reorder(&existing, &input.scene_ids)?;
    SceneRepo::apply_orders(&state.pool, timeline_id, &assignments).await?;

    tracing::info!(
        timeline_id,
        scenes = assignments.len(),
        user_id = auth.user_id,
        "Scenes reordered"
    );

    let scenes = SceneRepo::list_by_timeline(&state.pool, timeline_id).await?;
    Ok(Json(DataResponse { data: scenes }))
}

// ---------------------------------------------------------------------------
// By id
// ---------------------------------------------------------------------------

/// GET /api/v1/scenes/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (scene, _, _) = scope::scene(&state.pool, id, &auth, Access::View).await?;

    let (previous, next) = SceneRepo::neighbors(&state.pool, &scene).await?;
    let characters = CharacterRepo::list_for_scene(&state.pool, id).await?;
    let tags = TagRepo::list_for_scene(&state.pool, id).await?;
    let scene = load_with_relations(&state, id).await?;

    Ok(Json(DataResponse {
        data: SceneDetail {
            scene,
            characters,
            tags,
            previous,
            next,
        },
    }))
}

/// PUT /api/v1/scenes/{id}
///
/// Word count follows content; association lists replace the current ones.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScene>,
) -> AppResult<impl IntoResponse> {
    let (_, _, universe) = scope::scene(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;
    scope::ensure_associations(
        &state.pool,
        universe.id,
        input.character_ids.as_deref(),
        input.tag_ids.as_deref(),
    )
    .await?;

    SceneRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Scene", id))?;

    tracing::info!(scene_id = id, user_id = auth.user_id, "Scene updated");

    let scene = load_with_relations(&state, id).await?;
    Ok(Json(DataResponse { data: scene }))
}

/// DELETE /api/v1/scenes/{id}
///
/// The remaining scenes of the timeline are renumbered `1..=N`.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let (scene, _, _) = scope::scene(&state.pool, id, &auth, Access::Update).await?;

    if !SceneRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Scene", id));
    }

    tracing::info!(
        scene_id = id,
        timeline_id = scene.timeline_id,
        user_id = auth.user_id,
        "Scene deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/scenes/{id}/branch-point
pub async fn toggle_branch_point(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ToggleBranchPoint>,
) -> AppResult<impl IntoResponse> {
    scope::scene(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;

    let scene = SceneRepo::set_branch_point(
        &state.pool,
        id,
        input.is_branch_point,
        input.branch_question.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::not_found("Scene", id))?;

    tracing::info!(
        scene_id = id,
        is_branch_point = scene.is_branch_point,
        user_id = auth.user_id,
        "Branch point toggled"
    );

    Ok(Json(DataResponse { data: scene }))
}

/// POST /api/v1/scenes/{id}/branch
///
/// Start a new timeline from this scene, optionally copying the scenes
/// that follow it.
pub async fn create_branch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateBranch>,
) -> AppResult<impl IntoResponse> {
    let (scene, _, universe) = scope::scene(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;

    let outcome = BranchRepo::create_branch(&state.pool, universe.id, &scene, &input).await?;

    tracing::info!(
        scene_id = id,
        timeline_id = outcome.timeline.id,
        copied_scenes = outcome.copied_scenes,
        user_id = auth.user_id,
        "Branch created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// GET /api/v1/scenes/{id}/branches
///
/// Timelines that branch from this scene.
pub async fn list_branches(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    scope::scene(&state.pool, id, &auth, Access::View).await?;
    let branches = TimelineRepo::list_branches_of_scene(&state.pool, id).await?;

    tracing::debug!(count = branches.len(), scene_id = id, "Listed branches for scene");

    Ok(Json(DataResponse { data: branches }))
}
