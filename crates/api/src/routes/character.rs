use axum::routing::get;
use axum::Router;

use crate::handlers::character;
use crate::state::AppState;

/// Routes mounted at `/characters`: `GET, PUT, DELETE /{id}`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(character::show)
            .put(character::update)
            .delete(character::delete),
    )
}
