//! Request handlers, one submodule per resource.
//!
//! Handlers extract the caller, check the domain rules from
//! `loreforge_core`, delegate to the repositories in `loreforge_db` or the
//! cache tiers in `loreforge_cache`, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod auth;
pub mod cache;
pub mod campaigns;
pub mod canon;
pub mod characters;
pub mod image_proxy;
pub mod inventory;
pub mod prefetch;
