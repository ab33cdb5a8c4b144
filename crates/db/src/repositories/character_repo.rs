//! Repository for the `characters` table.

use sqlx::types::Json;
use sqlx::PgPool;
use storyverse_core::types::DbId;

use crate::models::character::{
    Character, CharacterAppearance, CharacterWithCount, CreateCharacter, UpdateCharacter,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, universe_id, name, nickname, type, description, traits, avatar_url, \
                       color, COALESCE(NULLIF(nickname, ''), name) AS display_name, \
                       created_at, updated_at";

/// Same columns qualified with the `c` alias, for joined queries.
const C_COLUMNS: &str = "c.id, c.universe_id, c.name, c.nickname, c.type, c.description, \
                         c.traits, c.avatar_url, c.color, \
                         COALESCE(NULLIF(c.nickname, ''), c.name) AS display_name, \
                         c.created_at, c.updated_at";

/// Provides CRUD operations for characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a new character, returning the created row.
    pub async fn create(
        pool: &PgPool,
        universe_id: DbId,
        input: &CreateCharacter,
    ) -> Result<Character, sqlx::Error> {
        let query = format!(
            "INSERT INTO characters (universe_id, name, nickname, type, description, traits, avatar_url, color)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(universe_id)
            .bind(&input.name)
            .bind(&input.nickname)
            .bind(&input.kind)
            .bind(&input.description)
            .bind(Json(input.traits.clone().unwrap_or_default()))
            .bind(&input.avatar_url)
            .bind(&input.color)
            .fetch_one(pool)
            .await
    }

    /// Find a character by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a universe's characters by name, with scene counts.
    pub async fn list_by_universe(
        pool: &PgPool,
        universe_id: DbId,
    ) -> Result<Vec<CharacterWithCount>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS},
                (SELECT COUNT(*) FROM scene_characters sc WHERE sc.character_id = c.id) AS scenes_count
             FROM characters c
             WHERE c.universe_id = $1
             ORDER BY c.name ASC, c.id ASC"
        );
        sqlx::query_as::<_, CharacterWithCount>(&query)
            .bind(universe_id)
            .fetch_all(pool)
            .await
    }

    /// Characters attached to a scene, by name.
    pub async fn list_for_scene(
        pool: &PgPool,
        scene_id: DbId,
    ) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS}
             FROM characters c
             JOIN scene_characters sc ON sc.character_id = c.id
             WHERE sc.scene_id = $1
             ORDER BY c.name ASC, c.id ASC"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(scene_id)
            .fetch_all(pool)
            .await
    }

    /// Scenes a character appears in, grouped by timeline then order.
    pub async fn appearances(
        pool: &PgPool,
        character_id: DbId,
    ) -> Result<Vec<CharacterAppearance>, sqlx::Error> {
        sqlx::query_as::<_, CharacterAppearance>(
            "SELECT s.id AS scene_id, s.title, s.\"order\", t.id AS timeline_id, t.name AS timeline_name
             FROM scene_characters sc
             JOIN scenes s ON s.id = sc.scene_id
             JOIN timelines t ON t.id = s.timeline_id
             WHERE sc.character_id = $1
             ORDER BY t.name ASC, t.id ASC, s.\"order\" ASC",
        )
        .bind(character_id)
        .fetch_all(pool)
        .await
    }

    /// How many of `ids` belong to the universe. Used to reject foreign ids.
    pub async fn count_in_universe(
        pool: &PgPool,
        universe_id: DbId,
        ids: &[DbId],
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(DISTINCT id) FROM characters WHERE universe_id = $1 AND id = ANY($2)",
        )
        .bind(universe_id)
        .bind(ids)
        .fetch_one(pool)
        .await
    }

    /// Update a character. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters SET
                name = COALESCE($2, name),
                nickname = COALESCE($3, nickname),
                type = COALESCE($4, type),
                description = COALESCE($5, description),
                traits = COALESCE($6, traits),
                avatar_url = COALESCE($7, avatar_url),
                color = COALESCE($8, color)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.nickname)
            .bind(&input.kind)
            .bind(&input.description)
            .bind(input.traits.clone().map(Json))
            .bind(&input.avatar_url)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    /// Delete a character. Its scene links go with it.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Transaction helpers
    // -----------------------------------------------------------------------

    /// Insert a character inside an open transaction.
    pub(crate) async fn insert_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        universe_id: DbId,
        character: &CharacterFields<'_>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO characters (universe_id, name, nickname, type, description, traits, avatar_url, color)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(universe_id)
        .bind(character.name)
        .bind(character.nickname)
        .bind(character.kind)
        .bind(character.description)
        .bind(Json(character.traits))
        .bind(character.avatar_url)
        .bind(character.color)
        .fetch_one(&mut **tx)
        .await
    }
}

/// Borrowed column values for [`CharacterRepo::insert_inner`].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CharacterFields<'a> {
    pub name: &'a str,
    pub nickname: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub description: Option<&'a str>,
    pub traits: &'a [String],
    pub avatar_url: Option<&'a str>,
    pub color: Option<&'a str>,
}

impl<'a> CharacterFields<'a> {
    pub(crate) fn of(character: &'a Character) -> Self {
        Self {
            name: &character.name,
            nickname: character.nickname.as_deref(),
            kind: character.kind.as_deref(),
            description: character.description.as_deref(),
            traits: &character.traits.0,
            avatar_url: character.avatar_url.as_deref(),
            color: character.color.as_deref(),
        }
    }
}
