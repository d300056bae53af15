//! Repository for the `campaigns` table.

use sqlx::PgPool;
use loreforge_core::campaign::{
    DEFAULT_MAX_PLAYERS, ROLE_GM, ROLE_PLAYER, STATUS_ACTIVE, STATUS_COMPLETED, STATUS_LOBBY,
};
use loreforge_core::types::DbId;

use crate::models::campaign::{Campaign, CreateCampaign};

/// Column list for campaigns queries.
const COLUMNS: &str = "id, title, description, universe, status, creator_id, game_master_id, \
    max_players, is_public, current_location, location_image_url, created_at, started_at, \
    last_activity, ended_at";

/// Provides lifecycle operations for campaigns.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Create a campaign in the lobby and seat its creator as a player.
    pub async fn create(
        pool: &PgPool,
        creator_id: DbId,
        input: &CreateCampaign,
    ) -> Result<Campaign, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO campaigns (title, description, universe, creator_id, max_players, is_public)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.universe)
            .bind(creator_id)
            .bind(input.max_players.unwrap_or(DEFAULT_MAX_PLAYERS))
            .bind(input.is_public.unwrap_or(true))
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO campaign_participants (campaign_id, user_id, role) VALUES ($1, $2, $3)",
        )
        .bind(campaign.id)
        .bind(creator_id)
        .bind(ROLE_PLAYER)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(campaign)
    }

    /// Find a campaign by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Public campaigns still accepting players, newest first.
    pub async fn list_public_lobbies(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns
             WHERE status = $1 AND is_public = true
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(STATUS_LOBBY)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Campaigns the user has a seat in, most recently active first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns
             WHERE id IN (SELECT campaign_id FROM campaign_participants WHERE user_id = $1)
             ORDER BY last_activity DESC, id DESC"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Change the status, stamping `started_at` on first activation and
    /// `ended_at` on completion.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET
                status = $2,
                started_at = CASE WHEN $2 = $3 AND started_at IS NULL THEN now() ELSE started_at END,
                ended_at = CASE WHEN $2 = $4 THEN now() ELSE ended_at END,
                last_activity = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(status)
            .bind(STATUS_ACTIVE)
            .bind(STATUS_COMPLETED)
            .fetch_one(pool)
            .await
    }

    /// Make `user_id` the game master.
    ///
    /// The previous GM's seat reverts to an unready player. The new GM's seat
    /// is marked ready.
    pub async fn set_game_master(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Campaign, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE campaign_participants SET role = $2, is_ready = false
             WHERE campaign_id = $1 AND role = $3",
        )
        .bind(id)
        .bind(ROLE_PLAYER)
        .bind(ROLE_GM)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE campaign_participants SET role = $3, is_ready = true
             WHERE campaign_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(ROLE_GM)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE campaigns SET game_master_id = $2, last_activity = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(campaign)
    }

    /// Clear the GM seat (used when the GM leaves the lobby).
    pub async fn clear_game_master(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE campaigns SET game_master_id = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Move the party to a new location.
    pub async fn set_location(
        pool: &PgPool,
        id: DbId,
        location: &str,
        image_url: Option<&str>,
    ) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET current_location = $2, location_image_url = $3,
                last_activity = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(location)
            .bind(image_url)
            .fetch_one(pool)
            .await
    }

    /// Bump `last_activity` to now.
    pub async fn touch_activity(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE campaigns SET last_activity = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete a campaign with its seats and messages.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
