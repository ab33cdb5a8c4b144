//! Scene search within a universe, and the filter options for its UI.

use axum::extract::{Path, Query, RawQuery, State};
use axum::Json;
use serde::Serialize;
use storyverse_core::search::match_context;
use storyverse_core::types::DbId;
use storyverse_db::models::character::CharacterWithCount;
use storyverse_db::models::scene::{SceneSearchParams, SceneSearchRow};
use storyverse_db::models::tag::TagWithCount;
use storyverse_db::models::timeline::TimelineWithCounts;
use storyverse_db::repositories::{CharacterRepo, SceneRepo, TagRepo, TimelineRepo};

use crate::error::AppResult;
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::query::{id_list, non_blank, SearchParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// A search result with the text around the first hit.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub scene: SceneSearchRow,
    pub match_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchFilters {
    pub tags: Vec<TagWithCount>,
    pub characters: Vec<CharacterWithCount>,
    pub timelines: Vec<TimelineWithCounts>,
    pub moods: Vec<String>,
}

/// GET /api/v1/universes/{id}/search
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
    Query(params): Query<SearchParams>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<DataResponse<Vec<SearchHit>>>> {
    scope::universe(&state.pool, universe_id, &auth, Access::View).await?;

    let query = non_blank(&params.q).map(str::to_string);
    let filters = SceneSearchParams {
        query: query.clone(),
        tag_ids: id_list(raw.as_deref(), "tag_ids"),
        character_ids: id_list(raw.as_deref(), "character_ids"),
        mood: non_blank(&params.mood).map(str::to_string),
        timeline_id: params.timeline_id,
        sort: params.sort,
        sort_dir: params.sort_dir,
        limit: params.limit,
    };

    let rows = SceneRepo::search(&state.pool, universe_id, &filters).await?;

    tracing::debug!(universe_id, hits = rows.len(), "Scene search");

    let hits = rows
        .into_iter()
        .map(|scene| SearchHit {
            match_context: query.as_deref().and_then(|q| context_for(&scene, q)),
            scene,
        })
        .collect();

    Ok(Json(DataResponse { data: hits }))
}

/// GET /api/v1/universes/{id}/search/filters
pub async fn filters(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SearchFilters>>> {
    scope::universe(&state.pool, universe_id, &auth, Access::View).await?;

    let filters = SearchFilters {
        tags: TagRepo::list_by_universe(&state.pool, universe_id).await?,
        characters: CharacterRepo::list_by_universe(&state.pool, universe_id).await?,
        timelines: TimelineRepo::list_by_universe(&state.pool, universe_id).await?,
        moods: SceneRepo::distinct_moods(&state.pool, universe_id).await?,
    };

    Ok(Json(DataResponse { data: filters }))
}

/// Window around the hit in the content, else the summary.
fn context_for(row: &SceneSearchRow, query: &str) -> Option<String> {
    row.scene
        .content
        .as_deref()
        .and_then(|content| match_context(content, query))
        .or_else(|| row.scene.summary.clone().filter(|s| !s.is_empty()))
}
