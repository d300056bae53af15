//! Payload broadcast to a campaign room.

use axum::extract::ws::Message;
use loreforge_core::campaign::{MSG_LOCATION_CHANGE, MSG_SYSTEM};
use loreforge_core::types::{DbId, Timestamp};
use serde::Serialize;

/// One event delivered to every connection in a campaign room.
///
/// `message_type` serializes as `type` and carries either a message type
/// (`player_speech`, `gm_narration`, ...) or `system` for server notices.
#[derive(Debug, Clone, Serialize)]
pub struct RoomEvent {
    #[serde(rename = "type")]
    pub message_type: String,
    pub content: String,
    pub campaign_id: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_image_url: Option<String>,
    pub timestamp: Timestamp,
}

impl RoomEvent {
    /// A message sent by a user (or by the server on a user's behalf).
    pub fn message(
        campaign_id: DbId,
        message_type: impl Into<String>,
        content: impl Into<String>,
        user_id: Option<DbId>,
    ) -> Self {
        Self {
            message_type: message_type.into(),
            content: content.into(),
            campaign_id,
            user_id,
            character_id: None,
            extra_data: None,
            location: None,
            location_image_url: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// A server notice such as "Player 4 joined the campaign".
    pub fn system(campaign_id: DbId, content: impl Into<String>) -> Self {
        Self::message(campaign_id, MSG_SYSTEM, content, None)
    }

    /// The party moved. Clients update the scene header from this.
    pub fn location_change(
        campaign_id: DbId,
        user_id: DbId,
        location: &str,
        image_url: Option<&str>,
    ) -> Self {
        Self {
            location: Some(location.to_string()),
            location_image_url: image_url.map(str::to_string),
            ..Self::message(campaign_id, MSG_LOCATION_CHANGE, location, Some(user_id))
        }
    }

    pub fn with_character(mut self, character_id: Option<DbId>) -> Self {
        self.character_id = character_id;
        self
    }

    pub fn with_extra_data(mut self, extra_data: Option<serde_json::Value>) -> Self {
        self.extra_data = extra_data;
        self
    }

    /// Encode as a text frame.
    pub fn to_message(&self) -> Message {
        let json = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode room event");
            String::from("{}")
        });
        Message::Text(json.into())
    }
}
