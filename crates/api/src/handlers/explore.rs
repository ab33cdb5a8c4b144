//! Public discovery of universes. No authentication required.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use storyverse_core::search::{ExploreSort, EXPLORE_PAGE_SIZE};
use storyverse_core::types::DbId;
use storyverse_db::models::character::CharacterWithCount;
use storyverse_db::models::timeline::TimelineWithCounts;
use storyverse_db::models::universe::{ExploreUniverse, Universe};
use storyverse_db::repositories::{CharacterRepo, TimelineRepo, UniverseRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::query::{non_blank, ExploreParams};
use crate::response::{DataResponse, PageMeta, PagedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PublicUniverse {
    #[serde(flatten)]
    pub universe: Universe,
    pub timelines: Vec<TimelineWithCounts>,
    pub characters: Vec<CharacterWithCount>,
    pub can_fork: bool,
}

/// GET /api/v1/explore
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ExploreParams>,
) -> AppResult<Json<PagedResponse<ExploreUniverse>>> {
    let search = non_blank(&params.search);
    let sort = ExploreSort::parse(params.sort.as_deref());

    let universes = UniverseRepo::explore(&state.pool, search, sort, params.page).await?;
    let total = UniverseRepo::count_public(&state.pool, search).await?;

    Ok(Json(PagedResponse {
        data: universes,
        meta: PageMeta::new(params.page, EXPLORE_PAGE_SIZE, total),
    }))
}

/// GET /api/v1/explore/{id}
///
/// Private universes are reported as missing.
pub async fn show(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PublicUniverse>>> {
    let universe = UniverseRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|u| u.is_public)
        .ok_or_else(|| AppError::not_found("Universe", id))?;

    let timelines = TimelineRepo::list_by_universe(&state.pool, id).await?;
    let characters = CharacterRepo::list_by_universe(&state.pool, id).await?;
    let can_fork = caller
        .user_id()
        .is_some_and(|user_id| universe.access().can_fork(user_id));

    Ok(Json(DataResponse {
        data: PublicUniverse {
            universe,
            timelines,
            characters,
            can_fork,
        },
    }))
}
