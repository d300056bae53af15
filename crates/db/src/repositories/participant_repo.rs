//! Repository for the `campaign_participants` table.

use sqlx::PgPool;
use loreforge_core::campaign::ROLE_PLAYER;
use loreforge_core::types::DbId;

use crate::models::campaign::CampaignParticipant;

/// Column list for campaign_participants queries.
const COLUMNS: &str = "id, campaign_id, user_id, character_id, role, is_ready, joined_at";

/// Provides seat operations for campaigns.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Seat a user as a player.
    pub async fn add(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: DbId,
        character_id: Option<DbId>,
    ) -> Result<CampaignParticipant, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaign_participants (campaign_id, user_id, character_id, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CampaignParticipant>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .bind(character_id)
            .bind(ROLE_PLAYER)
            .fetch_one(pool)
            .await
    }

    /// Remove a user's seat. Returns `true` if a row was removed.
    pub async fn remove(pool: &PgPool, campaign_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM campaign_participants WHERE campaign_id = $1 AND user_id = $2",
        )
        .bind(campaign_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All seats of a campaign in join order.
    pub async fn list(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<CampaignParticipant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaign_participants
             WHERE campaign_id = $1
             ORDER BY joined_at ASC, id ASC"
        );
        sqlx::query_as::<_, CampaignParticipant>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    /// A single user's seat, if any.
    pub async fn find(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: DbId,
    ) -> Result<Option<CampaignParticipant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaign_participants WHERE campaign_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, CampaignParticipant>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Set a seat's ready flag.
    pub async fn set_ready(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: DbId,
        is_ready: bool,
    ) -> Result<CampaignParticipant, sqlx::Error> {
        let query = format!(
            "UPDATE campaign_participants SET is_ready = $3
             WHERE campaign_id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CampaignParticipant>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .bind(is_ready)
            .fetch_one(pool)
            .await
    }

    /// Number of occupied seats.
    pub async fn count(pool: &PgPool, campaign_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM campaign_participants WHERE campaign_id = $1")
                .bind(campaign_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
