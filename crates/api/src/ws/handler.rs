use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use loreforge_core::campaign::can_post_message;
use loreforge_core::error::CoreError;
use loreforge_core::types::DbId;
use loreforge_db::repositories::{CampaignRepo, ParticipantRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::event::RoomEvent;
use crate::ws::manager::WsManager;

/// Query string of the upgrade request. Browsers cannot set headers on a
/// WebSocket handshake, so the access token travels here.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: Option<String>,
}

/// A message sent by a client over the room socket.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(rename = "type")]
    message_type: String,
    content: String,
    character_id: Option<DbId>,
    extra_data: Option<serde_json::Value>,
}

/// GET /api/v1/ws/campaigns/{id}?token=...
///
/// Authenticates the caller and checks their seat before upgrading, so an
/// unauthorized client gets a normal JSON error instead of a socket.
pub async fn campaign_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    Query(params): Query<WsAuthParams>,
) -> AppResult<Response> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let user = AuthUser::from_token(&token, &state.config.jwt)?;

    CampaignRepo::find_by_id(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;
    if ParticipantRepo::find(&state.pool, campaign_id, user.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not a participant of this campaign".into(),
        )));
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, campaign_id, user.user_id))
        .into_response())
}

/// Manage one room connection after upgrade.
///
/// Outbound frames flow from the manager channel through a sender task;
/// inbound frames are validated and relayed to the whole room. Relayed
/// messages are not persisted; clients use the REST endpoint for that.
async fn handle_socket(socket: WebSocket, state: AppState, campaign_id: DbId, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, campaign_id, user_id, "WebSocket connected");

    let ws_manager = state.ws_manager.clone();
    let mut rx = ws_manager
        .add(conn_id.clone(), Some(user_id), Some(campaign_id))
        .await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Err(reason) = relay(&state, campaign_id, user_id, text.as_str()).await {
                    let notice = RoomEvent::message(campaign_id, "error", reason, None);
                    ws_manager.send_to(&conn_id, notice.to_message()).await;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    disconnect(&ws_manager, &conn_id, campaign_id).await;
    tracing::info!(conn_id = %conn_id, campaign_id, user_id, "WebSocket disconnected");
}

/// Drop a connection from its room and tell the remaining members.
pub async fn disconnect(ws_manager: &WsManager, conn_id: &str, campaign_id: DbId) {
    ws_manager.remove(conn_id).await;
    ws_manager
        .broadcast_to_campaign(
            campaign_id,
            RoomEvent::system(campaign_id, "A player has disconnected").to_message(),
        )
        .await;
}

/// Validate an inbound frame against the sender's current seat and
/// broadcast it. Returns the message reported back to the sender on
/// rejection.
pub async fn relay(state: &AppState, campaign_id: DbId, user_id: DbId, raw: &str) -> Result<(), String> {
    let inbound: InboundMessage =
        serde_json::from_str(raw).map_err(|e| format!("Malformed message: {e}"))?;

    let seat = ParticipantRepo::find(&state.pool, campaign_id, user_id)
        .await
        .map_err(|e| {
            tracing::error!(campaign_id, user_id, error = %e, "Seat lookup failed");
            String::from("Could not verify your seat")
        })?
        .ok_or_else(|| String::from("You are no longer a participant"))?;

    can_post_message(&seat.role, &inbound.message_type).map_err(|e| e.to_string())?;

    let event = RoomEvent::message(
        campaign_id,
        inbound.message_type,
        inbound.content,
        Some(user_id),
    )
    .with_character(inbound.character_id)
    .with_extra_data(inbound.extra_data);
    let delivered = state
        .ws_manager
        .broadcast_to_campaign(campaign_id, event.to_message())
        .await;
    tracing::debug!(campaign_id, user_id, delivered, "Relayed room message");
    Ok(())
}
