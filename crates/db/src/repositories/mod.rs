//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod campaign_message_repo;
pub mod campaign_repo;
pub mod category_cache_repo;
pub mod character_repo;
pub mod image_cache_repo;
pub mod inventory_repo;
pub mod participant_repo;
pub mod scraping_log_repo;
pub mod wiki_article_repo;

pub use campaign_message_repo::CampaignMessageRepo;
pub use campaign_repo::CampaignRepo;
pub use category_cache_repo::CategoryCacheRepo;
pub use character_repo::CharacterRepo;
pub use image_cache_repo::ImageCacheRepo;
pub use inventory_repo::InventoryRepo;
pub use participant_repo::ParticipantRepo;
pub use scraping_log_repo::ScrapingLogRepo;
pub use wiki_article_repo::WikiArticleRepo;
