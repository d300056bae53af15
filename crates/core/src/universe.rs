//! Supported fictional universes and the Fandom wikis that back them.
//!
//! Each universe maps to one MediaWiki installation. The category map
//! translates the application's category names into the wiki's own category
//! titles for direct category lookups.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Star Wars (Wookieepedia).
pub const UNIVERSE_STAR_WARS: &str = "star_wars";

/// Star Trek (Memory Alpha).
pub const UNIVERSE_STAR_TREK: &str = "star_trek";

/// The Lord of the Rings (LOTR Fandom wiki).
pub const UNIVERSE_LOTR: &str = "lotr";

/// Universe used when none is configured.
pub const DEFAULT_UNIVERSE: &str = UNIVERSE_STAR_WARS;

/// Path of the MediaWiki action API relative to the wiki base URL.
pub const MEDIAWIKI_API_PATH: &str = "/api.php";

/// Path of the Fandom REST API relative to the wiki base URL.
pub const FANDOM_API_PATH: &str = "/api/v1";

/// Static description of a wiki-backed universe.
#[derive(Debug, Clone, Copy)]
pub struct WikiUniverse {
    /// Identifier used in URLs and database rows (e.g. `star_wars`).
    pub key: &'static str,
    /// Human-readable wiki name.
    pub name: &'static str,
    /// Wiki origin, without a trailing slash.
    pub base_url: &'static str,
    /// Category that lists every in-canon article.
    pub canon_category: &'static str,
    /// Application category -> wiki category title.
    pub category_map: &'static [(&'static str, &'static str)],
}

impl WikiUniverse {
    /// Full URL of the MediaWiki action API.
    pub fn mediawiki_api_url(&self) -> String {
        format!("{}{MEDIAWIKI_API_PATH}", self.base_url)
    }

    /// Full URL of the Fandom REST API root.
    pub fn fandom_api_url(&self) -> String {
        format!("{}{FANDOM_API_PATH}", self.base_url)
    }

    /// Look up the wiki category title for an application category.
    pub fn wiki_category(&self, category: &str) -> Option<&'static str> {
        self.category_map
            .iter()
            .find(|(app, _)| *app == category)
            .map(|(_, wiki)| *wiki)
    }
}

const UNIVERSES: &[WikiUniverse] = &[
    WikiUniverse {
        key: UNIVERSE_STAR_WARS,
        name: "Wookieepedia",
        base_url: "https://starwars.fandom.com",
        canon_category: "Canon_articles",
        category_map: &[
            ("planets", "Planets"),
            ("species", "Sentient_species"),
            ("characters", "Individuals"),
            ("weapons", "Weapons"),
            ("armor", "Armor"),
            ("vehicles", "Vehicles"),
            ("droids", "Droid_models"),
            ("items", "Technology"),
            ("organizations", "Organizations"),
            ("locations", "Locations"),
            ("battles", "Battles"),
            ("creatures", "Creatures"),
            ("technology", "Technology"),
        ],
    },
    WikiUniverse {
        key: UNIVERSE_STAR_TREK,
        name: "Memory Alpha",
        base_url: "https://memory-alpha.fandom.com",
        canon_category: "Articles",
        category_map: &[
            ("planets", "Planets"),
            ("species", "Species"),
            ("characters", "Individuals"),
            ("weapons", "Weapons"),
            ("armor", "Protective_gear"),
            ("vehicles", "Spacecraft"),
            ("technology", "Technology"),
            ("organizations", "Organizations"),
            ("locations", "Locations"),
        ],
    },
    WikiUniverse {
        key: UNIVERSE_LOTR,
        name: "The One Wiki to Rule Them All",
        base_url: "https://lotr.fandom.com",
        canon_category: "Articles",
        category_map: &[
            ("planets", "Realms"),
            ("species", "Races"),
            ("characters", "Characters"),
            ("weapons", "Weapons"),
            ("armor", "Armour"),
            ("vehicles", "Vehicles"),
            ("items", "Items"),
            ("organizations", "Organizations"),
            ("locations", "Locations"),
            ("creatures", "Creatures"),
        ],
    },
];

/// All supported universe keys, in declaration order.
pub fn supported_universes() -> Vec<&'static str> {
    UNIVERSES.iter().map(|u| u.key).collect()
}

/// Resolve a universe key to its wiki configuration.
pub fn universe_config(key: &str) -> Result<&'static WikiUniverse, CoreError> {
    UNIVERSES.iter().find(|u| u.key == key).ok_or_else(|| {
        CoreError::Validation(format!(
            "Unsupported universe '{key}'. Available: {:?}",
            supported_universes()
        ))
    })
}

/// Validate a universe key without needing the config.
pub fn validate_universe(key: &str) -> Result<(), CoreError> {
    universe_config(key).map(|_| ())
}
