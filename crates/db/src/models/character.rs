//! Player character model and DTOs.
//!
//! Sheet fields are stored as submitted; the JSON columns hold free-form
//! structures owned by the frontend.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

/// A row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub universe: String,
    pub race: Option<String>,
    pub class_type: Option<String>,
    pub level: i32,
    pub description: Option<String>,
    pub backstory: Option<String>,
    pub homeworld: Option<String>,
    pub born_year: Option<i32>,
    pub born_era: Option<String>,
    pub gender: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<i32>,
    pub skin_color: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub stats: serde_json::Value,
    pub inventory: serde_json::Value,
    pub skills: serde_json::Value,
    pub cybernetics: serde_json::Value,
    pub affiliations: serde_json::Value,
    pub wiki_data: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a character.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCharacter {
    pub name: String,
    pub universe: String,
    pub race: Option<String>,
    pub class_type: Option<String>,
    pub level: Option<i32>,
    pub description: Option<String>,
    pub backstory: Option<String>,
    pub homeworld: Option<String>,
    pub born_year: Option<i32>,
    pub born_era: Option<String>,
    pub gender: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<i32>,
    pub skin_color: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub stats: Option<serde_json::Value>,
    pub inventory: Option<serde_json::Value>,
    pub skills: Option<serde_json::Value>,
    pub cybernetics: Option<serde_json::Value>,
    pub affiliations: Option<serde_json::Value>,
    pub wiki_data: Option<serde_json::Value>,
}

/// DTO for a partial character update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub race: Option<String>,
    pub class_type: Option<String>,
    pub level: Option<i32>,
    pub description: Option<String>,
    pub backstory: Option<String>,
    pub homeworld: Option<String>,
    pub born_year: Option<i32>,
    pub born_era: Option<String>,
    pub gender: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<i32>,
    pub skin_color: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub stats: Option<serde_json::Value>,
    pub inventory: Option<serde_json::Value>,
    pub skills: Option<serde_json::Value>,
    pub cybernetics: Option<serde_json::Value>,
    pub affiliations: Option<serde_json::Value>,
    pub wiki_data: Option<serde_json::Value>,
}
