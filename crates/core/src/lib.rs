//! Domain logic shared by every Loreforge crate.
//!
//! Nothing in here performs I/O. Database, HTTP and filesystem concerns live
//! in `loreforge-db`, `loreforge-wiki` and `loreforge-cache`.

pub mod cache_ttl;
pub mod campaign;
pub mod canon;
pub mod category;
pub mod error;
pub mod hashing;
pub mod inventory;
pub mod prefetch;
pub mod roles;
pub mod search;
pub mod types;
pub mod universe;
