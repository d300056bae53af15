//! Multiplayer campaign rules: lobby gating, GM privileges and message types.
//!
//! Handlers load the campaign and participant rows, then call these checks
//! before mutating anything. Each check returns `Forbidden` when the caller
//! lacks the privilege and `Conflict` when the campaign is in the wrong state.

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_LOBBY: &str = "lobby";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PAUSED: &str = "paused";
pub const STATUS_COMPLETED: &str = "completed";

pub const ROLE_GM: &str = "gm";
pub const ROLE_PLAYER: &str = "player";

/// Default seats per campaign (GM included).
pub const DEFAULT_MAX_PLAYERS: i32 = 7;

/// Upper bound accepted for `max_players`.
pub const MAX_PLAYERS_LIMIT: i32 = 12;

/// Maximum campaign title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

pub const MSG_GM_NARRATION: &str = "gm_narration";
pub const MSG_GM_EVENT: &str = "gm_event";
pub const MSG_GM_CHOICE: &str = "gm_choice";
pub const MSG_PLAYER_ACTION: &str = "player_action";
pub const MSG_PLAYER_SPEECH: &str = "player_speech";
pub const MSG_DICE_ROLL: &str = "dice_roll";
pub const MSG_SYSTEM: &str = "system";
pub const MSG_LOCATION_CHANGE: &str = "location_change";
pub const MSG_ITEM_ADDED: &str = "item_added";

/// Every valid `campaign_messages.message_type`.
pub const MESSAGE_TYPES: &[&str] = &[
    MSG_GM_NARRATION,
    MSG_GM_EVENT,
    MSG_GM_CHOICE,
    MSG_PLAYER_ACTION,
    MSG_PLAYER_SPEECH,
    MSG_DICE_ROLL,
    MSG_SYSTEM,
    MSG_LOCATION_CHANGE,
    MSG_ITEM_ADDED,
];

/// Message types only the game master may send.
const GM_ONLY_MESSAGE_TYPES: &[&str] = &[
    MSG_GM_NARRATION,
    MSG_GM_EVENT,
    MSG_GM_CHOICE,
    MSG_LOCATION_CHANGE,
    MSG_ITEM_ADDED,
];

/// A seat in the campaign as seen by the rule checks.
#[derive(Debug, Clone, Copy)]
pub struct Seat<'a> {
    pub user_id: DbId,
    pub role: &'a str,
    pub is_ready: bool,
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Campaign title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Campaign title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_max_players(max_players: i32) -> Result<(), CoreError> {
    if (1..=MAX_PLAYERS_LIMIT).contains(&max_players) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "max_players must be between 1 and {MAX_PLAYERS_LIMIT}"
        )))
    }
}

pub fn validate_message_type(message_type: &str) -> Result<(), CoreError> {
    if MESSAGE_TYPES.contains(&message_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid message type '{message_type}'. Must be one of: {MESSAGE_TYPES:?}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Lobby rules
// ---------------------------------------------------------------------------

fn require_lobby(status: &str, action: &str) -> Result<(), CoreError> {
    if status == STATUS_LOBBY {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot {action}: campaign is {status}, not in lobby"
        )))
    }
}

/// A user may join a campaign that is still in the lobby and has a free seat.
pub fn can_join(
    status: &str,
    participant_count: i64,
    max_players: i32,
    already_joined: bool,
) -> Result<(), CoreError> {
    require_lobby(status, "join")?;
    if already_joined {
        return Err(CoreError::Conflict("Already joined this campaign".into()));
    }
    if participant_count >= i64::from(max_players) {
        return Err(CoreError::Conflict("Campaign is full".into()));
    }
    Ok(())
}

/// Participants other than the creator may leave while in the lobby.
pub fn can_leave(status: &str, user_id: DbId, creator_id: DbId) -> Result<(), CoreError> {
    if user_id == creator_id {
        return Err(CoreError::Forbidden(
            "The creator cannot leave; delete the campaign instead".into(),
        ));
    }
    require_lobby(status, "leave")
}

/// Players toggle their ready flag in the lobby; the GM is always ready.
pub fn can_toggle_ready(status: &str, role: &str) -> Result<(), CoreError> {
    if role == ROLE_GM {
        return Err(CoreError::Forbidden("The game master is always ready".into()));
    }
    require_lobby(status, "change ready state")
}

/// Only the creator assigns the GM, only in the lobby, and only to a participant.
pub fn can_assign_gm(
    status: &str,
    actor_id: DbId,
    creator_id: DbId,
    target_is_participant: bool,
) -> Result<(), CoreError> {
    if actor_id != creator_id {
        return Err(CoreError::Forbidden(
            "Only the campaign creator can assign the game master".into(),
        ));
    }
    require_lobby(status, "assign game master")?;
    if !target_is_participant {
        return Err(CoreError::Validation(
            "The new game master must be a participant".into(),
        ));
    }
    Ok(())
}

/// The GM starts the campaign once every player is ready.
pub fn can_start(
    status: &str,
    actor_id: DbId,
    game_master_id: Option<DbId>,
    seats: &[Seat<'_>],
) -> Result<(), CoreError> {
    let Some(gm_id) = game_master_id else {
        return Err(CoreError::Conflict(
            "A game master must be assigned before starting".into(),
        ));
    };
    if actor_id != gm_id {
        return Err(CoreError::Forbidden(
            "Only the game master can start the campaign".into(),
        ));
    }
    require_lobby(status, "start")?;

    let players: Vec<&Seat<'_>> = seats.iter().filter(|s| s.role == ROLE_PLAYER).collect();
    if players.is_empty() {
        return Err(CoreError::Conflict("At least one player is required".into()));
    }
    let waiting = players.iter().filter(|s| !s.is_ready).count();
    if waiting > 0 {
        return Err(CoreError::Conflict(format!(
            "{waiting} player(s) are not ready"
        )));
    }
    Ok(())
}

/// Only the creator deletes, and only before the campaign starts.
pub fn can_delete(status: &str, actor_id: DbId, creator_id: DbId) -> Result<(), CoreError> {
    if actor_id != creator_id {
        return Err(CoreError::Forbidden(
            "Only the campaign creator can delete it".into(),
        ));
    }
    require_lobby(status, "delete")
}

// ---------------------------------------------------------------------------
// In-game rules
// ---------------------------------------------------------------------------

/// Validate a GM-driven status change after the campaign has started.
///
/// Allowed: `active -> paused`, `paused -> active`, and `active | paused ->
/// completed`.
pub fn can_transition(
    from: &str,
    to: &str,
    actor_id: DbId,
    game_master_id: Option<DbId>,
) -> Result<(), CoreError> {
    if game_master_id != Some(actor_id) {
        return Err(CoreError::Forbidden(
            "Only the game master can change the campaign status".into(),
        ));
    }
    let allowed = matches!(
        (from, to),
        (STATUS_ACTIVE, STATUS_PAUSED)
            | (STATUS_PAUSED, STATUS_ACTIVE)
            | (STATUS_ACTIVE, STATUS_COMPLETED)
            | (STATUS_PAUSED, STATUS_COMPLETED)
    );
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot change campaign status from {from} to {to}"
        )))
    }
}

/// Check that `role` may post a message of `message_type`.
///
/// `system` messages are generated by the server and never accepted from
/// clients.
pub fn can_post_message(role: &str, message_type: &str) -> Result<(), CoreError> {
    validate_message_type(message_type)?;
    if message_type == MSG_SYSTEM {
        return Err(CoreError::Forbidden(
            "System messages cannot be posted by users".into(),
        ));
    }
    if GM_ONLY_MESSAGE_TYPES.contains(&message_type) && role != ROLE_GM {
        return Err(CoreError::Forbidden(format!(
            "Only the game master can send '{message_type}' messages"
        )));
    }
    Ok(())
}

/// Only the GM moves the party.
pub fn can_set_location(actor_id: DbId, game_master_id: Option<DbId>) -> Result<(), CoreError> {
    if game_master_id == Some(actor_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the game master can set the location".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
