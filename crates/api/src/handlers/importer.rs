//! Text import: preview and stats without persisting, and commit into a
//! universe as a new timeline.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyverse_core::error::CoreError;
use storyverse_core::importer::{parse, parse_with_stats, ParseStats, ParsedScene};
use storyverse_core::types::DbId;
use storyverse_core::validation::{validate_not_blank, MAX_CONTENT_LENGTH, MAX_NAME_LENGTH};
use storyverse_db::models::import::{
    ImportContent, ImportRequest, ImportResult, DEFAULT_IMPORT_TIMELINE_NAME,
};
use storyverse_db::repositories::ImportRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::query::non_blank;
use crate::state::AppState;

/// Request body for `POST /import/preview`.
#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[validate(
        length(min = 1, max = MAX_CONTENT_LENGTH),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub timeline_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub scenes: Vec<ParsedScene>,
    pub stats: ParseStats,
    pub timeline_name: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub result: ImportResult,
}

/// POST /api/v1/import/preview
pub async fn preview(
    auth: AuthUser,
    Json(input): Json<PreviewRequest>,
) -> AppResult<Json<PreviewResponse>> {
    input.validate()?;

    let (scenes, stats) = parse_with_stats(&input.content);
    tracing::debug!(user_id = auth.user_id, scenes = scenes.len(), "Import preview");

    Ok(Json(PreviewResponse {
        scenes,
        stats,
        timeline_name: non_blank(&input.timeline_name)
            .unwrap_or(DEFAULT_IMPORT_TIMELINE_NAME)
            .to_string(),
    }))
}

/// POST /api/v1/import/stats
pub async fn stats(
    _auth: AuthUser,
    Json(input): Json<ImportContent>,
) -> AppResult<Json<ParseStats>> {
    input.validate()?;
    let (_, stats) = parse_with_stats(&input.content);
    Ok(Json(stats))
}

/// POST /api/v1/universes/{id}/import
///
/// Everything lands in one transaction; zero parsed scenes is a 422.
pub async fn commit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
    Json(input): Json<ImportRequest>,
) -> AppResult<(StatusCode, Json<ImportResponse>)> {
    scope::universe(&state.pool, universe_id, &auth, Access::Update).await?;
    input.validate()?;

    let scenes = parse(&input.content);
    if scenes.is_empty() {
        return Err(CoreError::Validation("No scenes found in content".into()).into());
    }

    let result = ImportRepo::commit(&state.pool, universe_id, &input, &scenes).await?;

    tracing::info!(
        universe_id,
        timeline_id = result.timeline.id,
        scenes = result.scenes_count,
        characters = result.characters_count,
        tags = result.tags_count,
        user_id = auth.user_id,
        "Text import committed"
    );

    let message = format!(
        "Imported {} scenes to timeline '{}'",
        result.scenes_count, result.timeline.name
    );
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            success: true,
            message,
            result,
        }),
    ))
}
