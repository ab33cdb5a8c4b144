//! JSON and Markdown downloads of universes, timelines and scenes.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use storyverse_core::export::{
    sanitize_filename, scene_markdown, timeline_markdown, universe_markdown, ExportDocument,
    SceneDocument, TimelineDocument,
};
use storyverse_core::types::DbId;
use storyverse_db::repositories::ExportRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=UTF-8";

// ---------------------------------------------------------------------------
// Universe
// ---------------------------------------------------------------------------

/// GET /api/v1/universes/{id}/export/json
pub async fn universe_json(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let universe = scope::universe(&state.pool, id, &auth, Access::View).await?;
    let export = ExportRepo::universe(&state.pool, &universe).await?;

    tracing::info!(universe_id = id, user_id = auth.user_id, "Universe exported as JSON");

    json_download(
        &format!("{}_backup.json", stem(&universe.name)),
        ExportDocument::new(export, Utc::now()),
    )
}

/// GET /api/v1/universes/{id}/export/markdown
pub async fn universe_md(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let universe = scope::universe(&state.pool, id, &auth, Access::View).await?;
    let export = ExportRepo::universe(&state.pool, &universe).await?;

    tracing::info!(universe_id = id, user_id = auth.user_id, "Universe exported as Markdown");

    markdown_download(
        &format!("{}.md", stem(&universe.name)),
        universe_markdown(&export),
    )
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// GET /api/v1/timelines/{id}/export/json
pub async fn timeline_json(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let (timeline, _) = scope::timeline(&state.pool, id, &auth, Access::View).await?;
    let filename = format!("{}.json", stem(&timeline.name));
    let export = ExportRepo::timeline(&state.pool, timeline).await?;

    json_download(
        &filename,
        ExportDocument::new(TimelineDocument { timeline: export }, Utc::now()),
    )
}

/// GET /api/v1/timelines/{id}/export/markdown
pub async fn timeline_md(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let (timeline, _) = scope::timeline(&state.pool, id, &auth, Access::View).await?;
    let filename = format!("{}.md", stem(&timeline.name));
    let export = ExportRepo::timeline(&state.pool, timeline).await?;

    markdown_download(&filename, timeline_markdown(&export))
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// GET /api/v1/scenes/{id}/export/json
pub async fn scene_json(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    scope::scene(&state.pool, id, &auth, Access::View).await?;
    let export = ExportRepo::scene(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Scene", id))?;

    json_download(
        &format!("{}.json", stem(&export.title)),
        ExportDocument::new(SceneDocument { scene: export }, Utc::now()),
    )
}

/// GET /api/v1/scenes/{id}/export/markdown
pub async fn scene_md(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    scope::scene(&state.pool, id, &auth, Access::View).await?;
    let export = ExportRepo::scene(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Scene", id))?;

    markdown_download(
        &format!("{}.md", stem(&export.title)),
        scene_markdown(&export, 1),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stem(name: &str) -> String {
    let stem = sanitize_filename(name);
    if stem.is_empty() {
        "export".to_string()
    } else {
        stem
    }
}

fn attachment(filename: &str) -> AppResult<HeaderValue> {
    HeaderValue::try_from(format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::InternalError(format!("Invalid download filename: {e}")))
}

fn json_download<T: Serialize>(filename: &str, document: T) -> AppResult<Response> {
    Ok(([(CONTENT_DISPOSITION, attachment(filename)?)], Json(document)).into_response())
}

fn markdown_download(filename: &str, body: String) -> AppResult<Response> {
    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(MARKDOWN_CONTENT_TYPE)),
            (CONTENT_DISPOSITION, attachment(filename)?),
        ],
        body,
    )
        .into_response())
}
