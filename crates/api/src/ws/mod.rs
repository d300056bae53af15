//! WebSocket infrastructure for campaign rooms.
//!
//! Provides connection management, the room event payload, heartbeat
//! pings, and the HTTP upgrade handler used by Axum routes.

pub mod event;
mod handler;
mod heartbeat;
pub mod manager;

pub use event::RoomEvent;
pub use handler::{campaign_ws, disconnect, relay};
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
