//! Player inventory model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

/// A row from the `player_inventory` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryItem {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: DbId,
    pub character_id: Option<DbId>,
    pub item_name: String,
    pub item_category: String,
    pub item_image_url: Option<String>,
    pub item_description: Option<String>,
    pub quantity: i32,
    pub notes: Option<String>,
    pub added_by_gm_id: Option<DbId>,
    pub added_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for the GM handing an item to a player.
#[derive(Debug, Clone, Deserialize)]
pub struct AddInventoryItem {
    pub user_id: DbId,
    pub item_name: String,
    pub item_category: String,
    pub item_image_url: Option<String>,
    pub item_description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// DTO for changing an item. Absent fields are left unchanged; a quantity
/// of zero removes the item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInventoryItem {
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

/// Item count per seated player, for the GM's player panel.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryCount {
    pub user_id: DbId,
    pub item_count: i64,
}
