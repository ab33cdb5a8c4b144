//! Handlers for timelines: universe-scoped listing and creation, plus
//! show/update/delete and branch ancestry by id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use storyverse_core::branching::{ancestry, Ancestry};
use storyverse_core::types::DbId;
use storyverse_db::models::scene::{Scene, SceneWithRelations};
use storyverse_db::models::timeline::{CreateTimeline, Timeline, UpdateTimeline};
use storyverse_db::repositories::{SceneRepo, TimelineRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TimelineDetail {
    #[serde(flatten)]
    pub timeline: Timeline,
    pub scenes: Vec<SceneWithRelations>,
    /// The scene this timeline branched from.
    pub branch_from: Option<Scene>,
}

// ---------------------------------------------------------------------------
// Universe-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/universes/{id}/timelines
///
/// Canon first, then by name.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::View).await?;
    let timelines = TimelineRepo::list_by_universe(&state.pool, universe_id).await?;
    Ok(Json(DataResponse { data: timelines }))
}

/// POST /api/v1/universes/{id}/timelines
///
/// A canon timeline demotes the previous canon in the same transaction.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
    Json(input): Json<CreateTimeline>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::Update).await?;
    input.validate()?;
    scope::ensure_branch_origin(&state.pool, universe_id, input.branch_from_id).await?;

    let timeline = TimelineRepo::create(&state.pool, universe_id, &input).await?;

    tracing::info!(
        timeline_id = timeline.id,
        universe_id,
        user_id = auth.user_id,
        is_canon = timeline.is_canon,
        "Timeline created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: timeline })))
}

// ---------------------------------------------------------------------------
// By id
// ---------------------------------------------------------------------------

/// GET /api/v1/timelines/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (timeline, _) = scope::timeline(&state.pool, id, &auth, Access::View).await?;

    let scenes = SceneRepo::list_by_timeline(&state.pool, id).await?;
    let branch_from = match timeline.branch_from_id {
        Some(scene_id) => SceneRepo::find_by_id(&state.pool, scene_id).await?,
        None => None,
    };

    Ok(Json(DataResponse {
        data: TimelineDetail {
            timeline,
            scenes,
            branch_from,
        },
    }))
}

/// PUT /api/v1/timelines/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTimeline>,
) -> AppResult<impl IntoResponse> {
    let (_, universe) = scope::timeline(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;
    scope::ensure_branch_origin(&state.pool, universe.id, input.branch_from_id.flatten()).await?;

    let timeline = TimelineRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Timeline", id))?;

    tracing::info!(timeline_id = id, user_id = auth.user_id, "Timeline updated");

    Ok(Json(DataResponse { data: timeline }))
}

/// DELETE /api/v1/timelines/{id}
///
/// Removes the timeline's scenes; the scene it branched from is untouched.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope::timeline(&state.pool, id, &auth, Access::Update).await?;

    if !TimelineRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Timeline", id));
    }

    tracing::info!(timeline_id = id, user_id = auth.user_id, "Timeline deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/timelines/{id}/ancestry
///
/// The chain of branch origins back to a root timeline.
pub async fn ancestry_of(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ancestry>>> {
    let (timeline, universe) = scope::timeline(&state.pool, id, &auth, Access::View).await?;

    let links = TimelineRepo::branch_links(&state.pool, universe.id).await?;
    let walk = ancestry(timeline.id, &links);
    if walk.cyclic {
        tracing::warn!(timeline_id = id, "Branch ancestry contains a cycle");
    }

    Ok(Json(DataResponse { data: walk }))
}
