//! Well-known role names carried in the JWT `role` claim.

/// Administrator: may invalidate caches and trigger prefetch runs.
pub const ROLE_ADMIN: &str = "admin";

/// Regular player account.
pub const ROLE_USER: &str = "user";
