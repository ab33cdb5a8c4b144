//! Handlers for tags, including find-or-create by name.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use storyverse_core::types::DbId;
use storyverse_db::models::tag::{CreateTag, QuickCreateTag, UpdateTag};
use storyverse_db::repositories::TagRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/universes/{id}/tags
///
/// Ordered by category, then name.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::View).await?;
    let tags = TagRepo::list_by_universe(&state.pool, universe_id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/universes/{id}/tags
///
/// A duplicate name in the same universe is 409.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
    Json(input): Json<CreateTag>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::Update).await?;
    input.validate()?;

    let tag = TagRepo::create(&state.pool, universe_id, &input).await?;

    tracing::info!(tag_id = tag.id, universe_id, user_id = auth.user_id, "Tag created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// POST /api/v1/universes/{id}/tags/quick
///
/// 200 with the existing tag of that exact name, or 201 with a new one.
pub async fn quick_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
    Json(input): Json<QuickCreateTag>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::Update).await?;
    input.validate()?;

    let (tag, created) = TagRepo::find_or_create(&state.pool, universe_id, input.name.trim()).await?;

    let status = if created {
        tracing::info!(tag_id = tag.id, universe_id, user_id = auth.user_id, "Tag created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(DataResponse { data: tag })))
}

/// PUT /api/v1/tags/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<impl IntoResponse> {
    scope::tag(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;

    let tag = TagRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Tag", id))?;

    tracing::info!(tag_id = id, user_id = auth.user_id, "Tag updated");

    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope::tag(&state.pool, id, &auth, Access::Update).await?;

    if !TagRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Tag", id));
    }

    tracing::info!(tag_id = id, user_id = auth.user_id, "Tag deleted");

    Ok(StatusCode::NO_CONTENT)
}
