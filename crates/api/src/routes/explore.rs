use axum::routing::get;
use axum::Router;

use crate::handlers::explore;
use crate::state::AppState;

/// Routes mounted at `/explore`. Public.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(explore::list))
        .route("/{id}", get(explore::show))
}
