//! Route definitions for `/scenes`.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{export, scene};
use crate::state::AppState;

/// Routes mounted at `/scenes`.
///
/// ```text
/// GET, PUT, DELETE    /{id}
/// PATCH               /{id}/branch-point
/// POST                /{id}/branch
/// GET                 /{id}/branches
/// GET                 /{id}/export/json
/// GET                 /{id}/export/markdown
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(scene::show).put(scene::update).delete(scene::delete),
        )
        .route("/{id}/branch-point", patch(scene::toggle_branch_point))
        .route("/{id}/branch", post(scene::create_branch))
        .route("/{id}/branches", get(scene::list_branches))
        .route("/{id}/export/json", get(export::scene_json))
        .route("/{id}/export/markdown", get(export::scene_md))
}
