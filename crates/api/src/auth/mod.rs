//! Token validation for externally issued access tokens.
//!
//! - [`jwt`] -- HS256 claims, validation, and token minting for local tooling.

pub mod jwt;
