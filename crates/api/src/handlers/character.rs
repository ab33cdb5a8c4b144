//! Handlers for characters.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use storyverse_core::types::DbId;
use storyverse_db::models::character::{
    Character, CharacterAppearance, CreateCharacter, UpdateCharacter,
};
use storyverse_db::repositories::CharacterRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::scope::{self, Access};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CharacterDetail {
    #[serde(flatten)]
    pub character: Character,
    /// Scenes the character appears in, with their timeline.
    pub scenes: Vec<CharacterAppearance>,
}

/// GET /api/v1/universes/{id}/characters
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::View).await?;
    let characters = CharacterRepo::list_by_universe(&state.pool, universe_id).await?;
    Ok(Json(DataResponse { data: characters }))
}

/// POST /api/v1/universes/{id}/characters
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(universe_id): Path<DbId>,
    Json(input): Json<CreateCharacter>,
) -> AppResult<impl IntoResponse> {
    scope::universe(&state.pool, universe_id, &auth, Access::Update).await?;
    input.validate()?;

    let character = CharacterRepo::create(&state.pool, universe_id, &input).await?;

    tracing::info!(
        character_id = character.id,
        universe_id,
        user_id = auth.user_id,
        "Character created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: character })))
}

/// GET /api/v1/characters/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (character, _) = scope::character(&state.pool, id, &auth, Access::View).await?;
    let scenes = CharacterRepo::appearances(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: CharacterDetail { character, scenes },
    }))
}

/// PUT /api/v1/characters/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCharacter>,
) -> AppResult<impl IntoResponse> {
    scope::character(&state.pool, id, &auth, Access::Update).await?;
    input.validate()?;

    let character = CharacterRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Character", id))?;

    tracing::info!(character_id = id, user_id = auth.user_id, "Character updated");

    Ok(Json(DataResponse { data: character }))
}

/// DELETE /api/v1/characters/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    scope::character(&state.pool, id, &auth, Access::Update).await?;

    if !CharacterRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Character", id));
    }

    tracing::info!(character_id = id, user_id = auth.user_id, "Character deleted");

    Ok(StatusCode::NO_CONTENT)
}
