//! Route definitions for `/universes` and the resources nested under a universe.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{character, export, importer, search, tag, timeline, universe};
use crate::state::AppState;

/// Routes mounted at `/universes`.
///
/// ```text
/// GET, POST           /
/// GET, PUT, DELETE    /{id}
/// POST                /{id}/fork
/// GET, POST           /{id}/timelines
/// GET, POST           /{id}/characters
/// GET, POST           /{id}/tags
/// POST                /{id}/tags/quick
/// GET                 /{id}/search
/// GET                 /{id}/search/filters
/// POST                /{id}/import
/// GET                 /{id}/export/json
/// GET                 /{id}/export/markdown
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(universe::list_mine).post(universe::create))
        .route(
            "/{id}",
            get(universe::show)
                .put(universe::update)
                .delete(universe::delete),
        )
        .route("/{id}/fork", post(universe::fork))
        .route("/{id}/timelines", get(timeline::list).post(timeline::create))
        .route(
            "/{id}/characters",
            get(character::list).post(character::create),
        )
        .route("/{id}/tags", get(tag::list).post(tag::create))
        .route("/{id}/tags/quick", post(tag::quick_create))
        .route("/{id}/search", get(search::search))
        .route("/{id}/search/filters", get(search::filters))
        .route("/{id}/import", post(importer::commit))
        .route("/{id}/export/json", get(export::universe_json))
        .route("/{id}/export/markdown", get(export::universe_md))
}
