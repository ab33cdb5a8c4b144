pub mod auth;
pub mod character;
pub mod explore;
pub mod health;
pub mod import;
pub mod scene;
pub mod tag;
pub mod timeline;
pub mod universe;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh      public
/// /auth/logout                                    requires auth
///
/// /universes                                      list mine, create
/// /universes/{id}                                 get, update, delete
/// /universes/{id}/fork                            fork (POST)
/// /universes/{id}/timelines                       list, create
/// /universes/{id}/characters                      list, create
/// /universes/{id}/tags                            list, create
/// /universes/{id}/tags/quick                      find or create (POST)
/// /universes/{id}/search                          scene search
/// /universes/{id}/search/filters                  filter options
/// /universes/{id}/import                          commit text import (POST)
/// /universes/{id}/export/{json|markdown}          download
///
/// /timelines/{id}                                 get, update, delete
/// /timelines/{id}/ancestry                        branch ancestry
/// /timelines/{id}/scenes                          list, create
/// /timelines/{id}/scenes/reorder                  reorder (POST)
/// /timelines/{id}/export/{json|markdown}          download
///
/// /scenes/{id}                                    get, update, delete
/// /scenes/{id}/branch-point                       toggle (PATCH)
/// /scenes/{id}/branch                             branch (POST)
/// /scenes/{id}/branches                           list branches
/// /scenes/{id}/export/{json|markdown}             download
///
/// /characters/{id}                                get, update, delete
/// /tags/{id}                                      update, delete
///
/// /import/preview, /import/stats                  parse without saving (POST)
///
/// /explore, /explore/{id}                         public
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/universes", universe::router())
        .nest("/timelines", timeline::router())
        .nest("/scenes", scene::router())
        .nest("/characters", character::router())
        .nest("/tags", tag::router())
        .nest("/import", import::router())
        .nest("/explore", explore::router())
}
