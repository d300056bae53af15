//! Repository for the `characters` table.
//!
//! Every mutation is scoped by `owner_id` so callers cannot touch another
//! player's characters.

use sqlx::PgPool;
use loreforge_core::types::DbId;

use crate::models::character::{Character, CreateCharacter, UpdateCharacter};

/// Column list for characters queries.
const COLUMNS: &str = "id, owner_id, name, universe, race, class_type, level, description, \
    backstory, homeworld, born_year, born_era, gender, height, mass, skin_color, eye_color, \
    hair_color, stats, inventory, skills, cybernetics, affiliations, wiki_data, \
    created_at, updated_at";

/// Provides CRUD operations for characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Create a character owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateCharacter,
    ) -> Result<Character, sqlx::Error> {
        let query = format!(
            "INSERT INTO characters
                (owner_id, name, universe, race, class_type, level, description, backstory,
                 homeworld, born_year, born_era, gender, height, mass, skin_color, eye_color,
                 hair_color, stats, inventory, skills, cybernetics, affiliations, wiki_data)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 1), $7, $8, $9, $10, $11, $12, $13, $14,
                     $15, $16, $17,
                     COALESCE($18, '{{}}'::jsonb), COALESCE($19, '[]'::jsonb),
                     COALESCE($20, '[]'::jsonb), COALESCE($21, '[]'::jsonb),
                     COALESCE($22, '[]'::jsonb), COALESCE($23, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.universe)
            .bind(&input.race)
            .bind(&input.class_type)
            .bind(input.level)
            .bind(&input.description)
            .bind(&input.backstory)
            .bind(&input.homeworld)
            .bind(input.born_year)
            .bind(&input.born_era)
            .bind(&input.gender)
            .bind(input.height)
            .bind(input.mass)
            .bind(&input.skin_color)
            .bind(&input.eye_color)
            .bind(&input.hair_color)
            .bind(&input.stats)
            .bind(&input.inventory)
            .bind(&input.skills)
            .bind(&input.cybernetics)
            .bind(&input.affiliations)
            .bind(&input.wiki_data)
            .fetch_one(pool)
            .await
    }

    /// Find a character by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a player's characters, newest first, optionally for one universe.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        universe: Option<&str>,
    ) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters
             WHERE owner_id = $1 AND ($2::TEXT IS NULL OR universe = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(owner_id)
            .bind(universe)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Returns `None` if the character does not exist
    /// or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters SET
                name = COALESCE($3, name),
                race = COALESCE($4, race),
                class_type = COALESCE($5, class_type),
                level = COALESCE($6, level),
                description = COALESCE($7, description),
                backstory = COALESCE($8, backstory),
                homeworld = COALESCE($9, homeworld),
                born_year = COALESCE($10, born_year),
                born_era = COALESCE($11, born_era),
                gender = COALESCE($12, gender),
                height = COALESCE($13, height),
                mass = COALESCE($14, mass),
                skin_color = COALESCE($15, skin_color),
                eye_color = COALESCE($16, eye_color),
                hair_color = COALESCE($17, hair_color),
                stats = COALESCE($18, stats),
                inventory = COALESCE($19, inventory),
                skills = COALESCE($20, skills),
                cybernetics = COALESCE($21, cybernetics),
                affiliations = COALESCE($22, affiliations),
                wiki_data = COALESCE($23, wiki_data)
             WHERE id = $1 AND owner_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.race)
            .bind(&input.class_type)
            .bind(input.level)
            .bind(&input.description)
            .bind(&input.backstory)
            .bind(&input.homeworld)
            .bind(input.born_year)
            .bind(&input.born_era)
            .bind(&input.gender)
            .bind(input.height)
            .bind(input.mass)
            .bind(&input.skin_color)
            .bind(&input.eye_color)
            .bind(&input.hair_color)
            .bind(&input.stats)
            .bind(&input.inventory)
            .bind(&input.skills)
            .bind(&input.cybernetics)
            .bind(&input.affiliations)
            .bind(&input.wiki_data)
            .fetch_optional(pool)
            .await
    }

    /// Delete a character. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, owner_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
