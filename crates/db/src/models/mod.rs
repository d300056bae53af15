//! Row structs and input DTOs, one module per table family.

pub mod campaign;
pub mod category_cache;
pub mod character;
pub mod image_cache;
pub mod inventory;
pub mod scraping_log;
pub mod wiki_article;
