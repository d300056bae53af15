//! Repository for the `campaign_messages` table.

use sqlx::PgPool;
use loreforge_core::types::DbId;

use crate::models::campaign::{CampaignMessage, CreateCampaignMessage};

/// Column list for campaign_messages queries.
const COLUMNS: &str =
    "id, campaign_id, user_id, character_id, message_type, content, extra_data, created_at";

/// Provides the in-game message log.
pub struct CampaignMessageRepo;

impl CampaignMessageRepo {
    /// Append a message. `user_id` is `None` for server-generated messages.
    pub async fn create(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: Option<DbId>,
        input: &CreateCampaignMessage,
    ) -> Result<CampaignMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaign_messages
                (campaign_id, user_id, character_id, message_type, content, extra_data)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CampaignMessage>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .bind(input.character_id)
            .bind(&input.message_type)
            .bind(&input.content)
            .bind(&input.extra_data)
            .fetch_one(pool)
            .await
    }

    /// The newest `limit` messages (optionally older than `before_id`),
    /// returned oldest first.
    pub async fn list(
        pool: &PgPool,
        campaign_id: DbId,
        limit: i64,
        before_id: Option<DbId>,
    ) -> Result<Vec<CampaignMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM (
                SELECT {COLUMNS} FROM campaign_messages
                WHERE campaign_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
                ORDER BY id DESC
                LIMIT $3
             ) page
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, CampaignMessage>(&query)
            .bind(campaign_id)
            .bind(before_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
