//! Player inventory rules for campaigns.
//!
//! The game master hands out items drawn from the canon item categories.
//! Players only ever read their own inventory.

use std::collections::BTreeMap;

use crate::category::ITEM_IMAGE_CATEGORIES;
use crate::error::CoreError;
use crate::types::DbId;

pub const MAX_ITEM_NAME_LENGTH: usize = 255;
pub const MAX_ITEM_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_ITEM_NOTES_LENGTH: usize = 500;
pub const MAX_ITEM_IMAGE_URL_LENGTH: usize = 500;

/// Largest stack a single inventory row may hold.
pub const MAX_ITEM_QUANTITY: i32 = 999;

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    match value {
        Some(v) if v.chars().count() > max => Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Validate an item the GM is about to add.
pub fn validate_new_item(
    name: &str,
    category: &str,
    quantity: i32,
    description: Option<&str>,
    notes: Option<&str>,
    image_url: Option<&str>,
) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Item name must not be empty".into()));
    }
    check_length("Item name", Some(name.trim()), MAX_ITEM_NAME_LENGTH)?;
    if !ITEM_IMAGE_CATEGORIES.contains(&category) {
        return Err(CoreError::Validation(format!(
            "Invalid item category '{category}'. Must be one of: {ITEM_IMAGE_CATEGORIES:?}"
        )));
    }
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(CoreError::Validation(format!(
            "Quantity must be between 1 and {MAX_ITEM_QUANTITY}"
        )));
    }
    check_length("Description", description, MAX_ITEM_DESCRIPTION_LENGTH)?;
    check_length("Notes", notes, MAX_ITEM_NOTES_LENGTH)?;
    check_length("Image URL", image_url, MAX_ITEM_IMAGE_URL_LENGTH)
}

/// Validate a quantity change. Zero is accepted and removes the row.
pub fn validate_quantity_update(quantity: i32) -> Result<(), CoreError> {
    if (0..=MAX_ITEM_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Quantity must be between 0 and {MAX_ITEM_QUANTITY}"
        )))
    }
}

/// Quantity after stacking `added` onto an existing row, capped at the maximum.
pub fn stacked_quantity(existing: i32, added: i32) -> i32 {
    existing.saturating_add(added).min(MAX_ITEM_QUANTITY)
}

pub fn validate_notes(notes: &str) -> Result<(), CoreError> {
    check_length("Notes", Some(notes), MAX_ITEM_NOTES_LENGTH)
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Only the game master adds, changes or removes items.
pub fn can_manage_inventory(actor_id: DbId, game_master_id: Option<DbId>) -> Result<(), CoreError> {
    if game_master_id == Some(actor_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the game master can manage inventory".into(),
        ))
    }
}

/// Players see their own inventory; the GM sees everyone's.
pub fn can_view_inventory(
    actor_id: DbId,
    owner_id: DbId,
    game_master_id: Option<DbId>,
) -> Result<(), CoreError> {
    if actor_id == owner_id || game_master_id == Some(actor_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You can only view your own inventory".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Totals over one player's items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryTally {
    pub total_items: i64,
    pub items_by_category: BTreeMap<String, i64>,
}

/// Sum quantities overall and per category from `(category, quantity)` pairs.
pub fn tally<'a, I>(items: I) -> InventoryTally
where
    I: IntoIterator<Item = (&'a str, i32)>,
{
    let mut tally = InventoryTally::default();
    for (category, quantity) in items {
        let quantity = i64::from(quantity);
        tally.total_items += quantity;
        *tally
            .items_by_category
            .entry(category.to_string())
            .or_insert(0) += quantity;
    }
    tally
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
