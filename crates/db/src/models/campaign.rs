//! Multiplayer campaign, participant and message models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use loreforge_core::types::{DbId, Timestamp};

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub universe: String,
    pub status: String,
    pub creator_id: DbId,
    pub game_master_id: Option<DbId>,
    pub max_players: i32,
    pub is_public: bool,
    pub current_location: Option<String>,
    pub location_image_url: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub last_activity: Timestamp,
    pub ended_at: Option<Timestamp>,
}

/// DTO for creating a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub title: String,
    pub description: Option<String>,
    pub universe: String,
    pub max_players: Option<i32>,
    pub is_public: Option<bool>,
}

/// A row from the `campaign_participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignParticipant {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: DbId,
    pub character_id: Option<DbId>,
    pub role: String,
    pub is_ready: bool,
    pub joined_at: Timestamp,
}

/// Campaign with its seats, returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub participants: Vec<CampaignParticipant>,
}

/// A row from the `campaign_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignMessage {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: Option<DbId>,
    pub character_id: Option<DbId>,
    pub message_type: String,
    pub content: String,
    pub extra_data: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for posting a message to a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignMessage {
    pub message_type: String,
    pub content: String,
    pub character_id: Option<DbId>,
    pub extra_data: Option<serde_json::Value>,
}
