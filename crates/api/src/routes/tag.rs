use axum::routing::put;
use axum::Router;

use crate::handlers::tag;
use crate::state::AppState;

/// Routes mounted at `/tags`: `PUT, DELETE /{id}`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", put(tag::update).delete(tag::delete))
}
