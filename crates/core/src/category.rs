//! Application categories and keyword-based article categorization.
//!
//! Wiki articles carry dozens of free-form wiki categories. The categorizer
//! scores each application category by how many of its keywords overlap the
//! article's wiki categories and picks the best one.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Category sets
// ---------------------------------------------------------------------------

/// Every application category, in scoring priority order.
pub const ALL_CATEGORIES: &[&str] = &[
    "characters",
    "planets",
    "species",
    "weapons",
    "armor",
    "vehicles",
    "droids",
    "items",
    "organizations",
    "locations",
    "battles",
    "creatures",
    "media",
    "technology",
];

/// Categories covered by cross-category search.
pub const SEARCHABLE_CATEGORIES: &[&str] = &[
    "planets",
    "species",
    "characters",
    "weapons",
    "armor",
    "vehicles",
    "droids",
    "organizations",
];

/// Categories whose images are downloaded during prefetch.
pub const VISUAL_CATEGORIES: &[&str] = &["planets", "weapons", "armor", "vehicles", "droids", "items"];

/// Categories exposed by the "items with images" endpoint.
pub const ITEM_IMAGE_CATEGORIES: &[&str] = &["weapons", "armor", "items", "vehicles", "droids"];

/// Fallback limit for categories without a tuned default.
pub const FALLBACK_CATEGORY_LIMIT: i64 = 1000;

/// Expected upper bound of articles per category, used when loading a whole
/// category at once.
pub fn default_category_limit(category: &str) -> i64 {
    match category {
        "planets" => 2000,
        "species" => 2000,
        "characters" => 15000,
        "weapons" => 1200,
        "armor" => 300,
        "vehicles" => 2000,
        "droids" => 400,
        "items" => 4000,
        "organizations" => 1500,
        "locations" => 5000,
        "battles" => 800,
        "creatures" => 1500,
        "technology" => 800,
        _ => FALLBACK_CATEGORY_LIMIT,
    }
}

/// Validate that `category` is a known application category.
pub fn validate_category(category: &str) -> Result<(), CoreError> {
    validate_category_in(category, ALL_CATEGORIES)
}

/// Validate that `category` belongs to `allowed`, listing the options on failure.
pub fn validate_category_in(category: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&category) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid category '{category}'. Available: {}",
            allowed.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "characters",
        &[
            "Individuals", "Characters", "Humans", "Males", "Females", "Jedi", "Sith", "Rebels",
            "Imperials", "Clones", "Force-sensitives", "Mandalorians", "Bounty hunters", "Pilots",
            "Commanders", "Generals", "Admirals", "Smugglers", "Pirates", "Mercenaries",
            "Assassins", "Senators", "Politicians", "Diplomats", "Leaders", "Padawans", "Knights",
            "Masters", "Lords",
        ],
    ),
    (
        "planets",
        &[
            "Planets", "Astronomical objects", "Moons", "Star systems", "Sectors", "Regions",
            "Space stations", "Asteroids", "Nebulae", "Worlds", "Systems", "Orbits",
        ],
    ),
    (
        "species",
        &[
            "Species", "Sentient species", "Non-sentient species", "Humanoids", "Reptilians",
            "Amphibians", "Mammals", "Insectoids", "Avians", "Aquatic species",
        ],
    ),
    (
        "weapons",
        &[
            "Weapons", "Blasters", "Lightsabers", "Explosives", "Melee weapons", "Ranged weapons",
            "Missiles", "Cannons", "Rifles", "Pistols", "Grenades", "Bombs", "Torpedoes",
        ],
    ),
    (
        "armor",
        &[
            "Armor", "Protective gear", "Clothing", "Uniforms", "Helmets", "Suits", "Robes",
            "Garments", "Attire",
        ],
    ),
    (
        "vehicles",
        &[
            "Vehicles", "Starships", "Starfighters", "Capital ships", "Transports", "Speeders",
            "Walkers", "Cruisers", "Freighters", "Corvettes", "Frigates", "Destroyers", "Shuttles",
            "Fighters", "Bombers", "Interceptors",
        ],
    ),
    (
        "droids",
        &[
            "Droids", "Droid models", "Protocol droids", "Astromech droids", "Battle droids",
            "Medical droids", "Service droids", "Utility droids", "Repair droids",
        ],
    ),
    (
        "items",
        &[
            "Technology", "Equipment", "Tools", "Devices", "Objects", "Artifacts", "Instruments",
            "Gadgets", "Machinery", "Computers", "Holocrons", "Crystals",
        ],
    ),
    (
        "organizations",
        &[
            "Organizations", "Governments", "Factions", "Companies", "Orders", "Guilds", "Gangs",
            "Empires", "Republics", "Alliances", "Confederacies", "Syndicates", "Cartels",
            "Corporations", "Military units", "Squadrons",
        ],
    ),
    (
        "locations",
        &[
            "Locations", "Cities", "Bases", "Structures", "Buildings", "Temples", "Palaces",
            "Installations", "Fortresses", "Outposts", "Settlements", "Facilities", "Landmarks",
            "Monuments", "Districts", "Quarters", "Stations",
        ],
    ),
    (
        "battles",
        &[
            "Battles", "Conflicts", "Wars", "Sieges", "Campaigns", "Events", "Operations",
            "Missions", "Skirmishes", "Engagements", "Assaults", "Invasions",
        ],
    ),
    (
        "creatures",
        &[
            "Creatures", "Animals", "Beasts", "Fauna", "Monsters", "Predators", "Wildlife",
            "Organisms",
        ],
    ),
    (
        "media",
        &[
            "Media", "Films", "Television", "Books", "Comics", "Games", "Novels", "Series",
            "Episodes", "Chapters", "Issues", "Magazines", "Publications",
        ],
    ),
    (
        "technology",
        &[
            "Technology", "Science", "Physics", "Hyperspace", "Communications", "Sensors",
            "Shields", "Reactors", "Engines", "Propulsion", "Navigation", "Scanners",
        ],
    ),
];

// ---------------------------------------------------------------------------
// Categorization
// ---------------------------------------------------------------------------

/// Pick the application category that best matches an article's wiki
/// categories.
///
/// A keyword scores one point per wiki category it overlaps (either string
/// containing the other, case-insensitively). Ties resolve to the category
/// listed first in [`ALL_CATEGORIES`]. Returns `None` when nothing matches.
pub fn categorize_article<S: AsRef<str>>(wiki_categories: &[S]) -> Option<&'static str> {
    if wiki_categories.is_empty() {
        return None;
    }

    let lowered: Vec<String> = wiki_categories
        .iter()
        .map(|c| c.as_ref().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    let mut best: Option<(&'static str, usize)> = None;
    for (category, keywords) in CATEGORY_KEYWORDS {
        let mut score = 0;
        for keyword in keywords.iter() {
            let keyword = keyword.to_lowercase();
            for wiki_cat in &lowered {
                if wiki_cat.contains(&keyword) || keyword.contains(wiki_cat.as_str()) {
                    score += 1;
                }
            }
        }

        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((category, score));
        }
    }

    best.map(|(category, _)| category)
}

/// Normalize a raw wiki category title.
///
/// Strips the `Category:` namespace and `Canon_` prefixes. Returns `None` for
/// empty names and the bare `articles` maintenance category.
pub fn normalize_wiki_category(raw: &str) -> Option<String> {
    let name = raw.strip_prefix("Category:").unwrap_or(raw);
    let name = name.strip_prefix("Canon_").unwrap_or(name);
    let name = name.strip_prefix("Canon ").unwrap_or(name);

    if name.is_empty() || name.eq_ignore_ascii_case("articles") {
        None
    } else {
        Some(name.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
