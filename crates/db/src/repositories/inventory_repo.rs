//! Repository for the `player_inventory` table.
//!
//! Item operations are scoped by `campaign_id` so an item id from one
//! campaign never resolves in another.

use sqlx::PgPool;
use loreforge_core::inventory::MAX_ITEM_QUANTITY;
use loreforge_core::types::DbId;

use crate::models::inventory::{AddInventoryItem, InventoryCount, InventoryItem};

/// Column list for player_inventory queries.
const COLUMNS: &str = "id, campaign_id, user_id, character_id, item_name, item_category, \
    item_image_url, item_description, quantity, notes, added_by_gm_id, added_at, updated_at";

/// Provides inventory operations for campaigns.
pub struct InventoryRepo;

impl InventoryRepo {
    /// Give an item to a player. A second grant of the same item name to the
    /// same player stacks onto the existing row, capped at the maximum.
    pub async fn add(
        pool: &PgPool,
        campaign_id: DbId,
        character_id: Option<DbId>,
        added_by: DbId,
        input: &AddInventoryItem,
    ) -> Result<InventoryItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO player_inventory
                (campaign_id, user_id, character_id, item_name, item_category, item_image_url,
                 item_description, quantity, notes, added_by_gm_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (campaign_id, user_id, item_name) DO UPDATE SET
                quantity = LEAST(player_inventory.quantity + EXCLUDED.quantity, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(campaign_id)
            .bind(input.user_id)
            .bind(character_id)
            .bind(input.item_name.trim())
            .bind(&input.item_category)
            .bind(&input.item_image_url)
            .bind(&input.item_description)
            .bind(input.quantity)
            .bind(&input.notes)
            .bind(added_by)
            .bind(MAX_ITEM_QUANTITY)
            .fetch_one(pool)
            .await
    }

    /// One player's items, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM player_inventory
             WHERE campaign_id = $1 AND user_id = $2
             ORDER BY added_at DESC, id DESC"
        );
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every item in a campaign, grouped by player.
    pub async fn list_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM player_inventory
             WHERE campaign_id = $1
             ORDER BY user_id, added_at DESC, id DESC"
        );
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        campaign_id: DbId,
        item_id: DbId,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM player_inventory WHERE id = $1 AND campaign_id = $2"
        );
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(item_id)
            .bind(campaign_id)
            .fetch_optional(pool)
            .await
    }

    /// Change the quantity and/or notes. Absent fields are left unchanged.
    pub async fn update(
        pool: &PgPool,
        campaign_id: DbId,
        item_id: DbId,
        quantity: Option<i32>,
        notes: Option<&str>,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let query = format!(
            "UPDATE player_inventory SET
                quantity = COALESCE($3, quantity),
                notes = COALESCE($4, notes)
             WHERE id = $1 AND campaign_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(item_id)
            .bind(campaign_id)
            .bind(quantity)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Remove an item. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, campaign_id: DbId, item_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM player_inventory WHERE id = $1 AND campaign_id = $2")
            .bind(item_id)
            .bind(campaign_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of distinct items held by each player who has any.
    pub async fn counts_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<InventoryCount>, sqlx::Error> {
        sqlx::query_as::<_, InventoryCount>(
            "SELECT user_id, COUNT(*) AS item_count FROM player_inventory
             WHERE campaign_id = $1
             GROUP BY user_id",
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
    }
}
