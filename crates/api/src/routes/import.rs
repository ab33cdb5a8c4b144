use axum::routing::post;
use axum::Router;

use crate::handlers::importer;
use crate::state::AppState;

/// Routes mounted at `/import`. Neither persists anything.
///
/// ```text
/// POST /preview  -> parsed scenes + stats
/// POST /stats    -> stats only
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/preview", post(importer::preview))
        .route("/stats", post(importer::stats))
}
