//! Loreforge API server library.
//!
//! Exposes config, state, error handling, routes and the WebSocket room
//! infrastructure so integration tests and the binary entrypoint share them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
