//! Route definitions for `/timelines`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{export, scene, timeline};
use crate::state::AppState;

/// Routes mounted at `/timelines`.
///
/// ```text
/// GET, PUT, DELETE    /{id}
/// GET                 /{id}/ancestry
/// GET, POST           /{id}/scenes
/// POST                /{id}/scenes/reorder
/// GET                 /{id}/export/json
/// GET                 /{id}/export/markdown
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(timeline::show)
                .put(timeline::update)
                .delete(timeline::delete),
        )
        .route("/{id}/ancestry", get(timeline::ancestry_of))
        .route("/{id}/scenes", get(scene::list).post(scene::create))
        .route("/{id}/scenes/reorder", post(scene::reorder))
        .route("/{id}/export/json", get(export::timeline_json))
        .route("/{id}/export/markdown", get(export::timeline_md))
}
