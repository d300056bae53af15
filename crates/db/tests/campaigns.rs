//! Integration tests for characters, campaigns, seats and messages.

use serde_json::json;
use sqlx::PgPool;
use loreforge_db::models::campaign::{CreateCampaign, CreateCampaignMessage};
use loreforge_db::models::character::{CreateCharacter, UpdateCharacter};
use loreforge_db::models::inventory::AddInventoryItem;
use loreforge_db::repositories::{
    CampaignMessageRepo, CampaignRepo, CharacterRepo, InventoryRepo, ParticipantRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_character(name: &str) -> CreateCharacter {
    CreateCharacter {
        name: name.to_string(),
        universe: "star_wars".to_string(),
        race: Some("Human".to_string()),
        class_type: None,
        level: None,
        description: None,
        backstory: None,
        homeworld: None,
        born_year: None,
        born_era: None,
        gender: None,
        height: None,
        mass: None,
        skin_color: None,
        eye_color: None,
        hair_color: None,
        stats: None,
        inventory: None,
        skills: None,
        cybernetics: None,
        affiliations: None,
        wiki_data: None,
    }
}

fn new_campaign(title: &str) -> CreateCampaign {
    CreateCampaign {
        title: title.to_string(),
        description: None,
        universe: "star_wars".to_string(),
        max_players: None,
        is_public: None,
    }
}

fn item(user_id: i64, name: &str, category: &str, quantity: i32) -> AddInventoryItem {
    AddInventoryItem {
        user_id,
        item_name: name.to_string(),
        item_category: category.to_string(),
        item_image_url: None,
        item_description: None,
        quantity,
        notes: None,
    }
}

fn message(kind: &str, content: &str) -> CreateCampaignMessage {
    CreateCampaignMessage {
        message_type: kind.to_string(),
        content: content.to_string(),
        character_id: None,
        extra_data: None,
    }
}

// ---------------------------------------------------------------------------
// Test: characters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn character_crud_is_owner_scoped(pool: PgPool) {
    let created = CharacterRepo::create(&pool, 1, &new_character("Kira")).await.unwrap();
    assert_eq!(created.level, 1);
    assert_eq!(created.stats, json!({}));
    assert_eq!(created.inventory, json!([]));

    let update = UpdateCharacter {
        level: Some(3),
        ..Default::default()
    };
    assert!(CharacterRepo::update(&pool, created.id, 2, &update)
        .await
        .unwrap()
        .is_none());
    let updated = CharacterRepo::update(&pool, created.id, 1, &update)
        .await
        .unwrap()
        .expect("owner can update");
    assert_eq!(updated.level, 3);
    assert_eq!(updated.race.as_deref(), Some("Human"));

    assert_eq!(CharacterRepo::list_by_owner(&pool, 1, None).await.unwrap().len(), 1);
    assert!(CharacterRepo::list_by_owner(&pool, 1, Some("lotr")).await.unwrap().is_empty());

    assert!(!CharacterRepo::delete(&pool, created.id, 2).await.unwrap());
    assert!(CharacterRepo::delete(&pool, created.id, 1).await.unwrap());
    assert!(CharacterRepo::find_by_id(&pool, created.id).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: campaign lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_seats_the_creator(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Outer Rim")).await.unwrap();
    assert_eq!(campaign.status, "lobby");
    assert_eq!(campaign.max_players, 7);
    assert!(campaign.is_public);

    let seats = ParticipantRepo::list(&pool, campaign.id).await.unwrap();
    assert_eq!(seats.len(), 1);
    assert_eq!(seats[0].user_id, 10);
    assert_eq!(seats[0].role, "player");

    let lobbies = CampaignRepo::list_public_lobbies(&pool, 20, 0).await.unwrap();
    assert_eq!(lobbies.len(), 1);
    assert_eq!(CampaignRepo::list_for_user(&pool, 10).await.unwrap().len(), 1);
    assert!(CampaignRepo::list_for_user(&pool, 11).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_game_master_swaps_roles(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Kessel Run")).await.unwrap();
    ParticipantRepo::add(&pool, campaign.id, 11, None).await.unwrap();

    let updated = CampaignRepo::set_game_master(&pool, campaign.id, 10).await.unwrap();
    assert_eq!(updated.game_master_id, Some(10));

    let updated = CampaignRepo::set_game_master(&pool, campaign.id, 11).await.unwrap();
    assert_eq!(updated.game_master_id, Some(11));

    let old = ParticipantRepo::find(&pool, campaign.id, 10).await.unwrap().unwrap();
    assert_eq!(old.role, "player");
    assert!(!old.is_ready);
    let new = ParticipantRepo::find(&pool, campaign.id, 11).await.unwrap().unwrap();
    assert_eq!(new.role, "gm");
    assert!(new.is_ready);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_changes_stamp_timestamps(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Endor Strike")).await.unwrap();

    let active = CampaignRepo::update_status(&pool, campaign.id, "active").await.unwrap();
    let started = active.started_at.expect("started_at set on activation");
    assert!(active.ended_at.is_none());
    assert!(CampaignRepo::list_public_lobbies(&pool, 20, 0).await.unwrap().is_empty());

    CampaignRepo::update_status(&pool, campaign.id, "paused").await.unwrap();
    let resumed = CampaignRepo::update_status(&pool, campaign.id, "active").await.unwrap();
    assert_eq!(resumed.started_at, Some(started));

    let done = CampaignRepo::update_status(&pool, campaign.id, "completed").await.unwrap();
    assert!(done.ended_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_seat_violates_unique_constraint(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Hoth Defense")).await.unwrap();
    ParticipantRepo::add(&pool, campaign.id, 11, None).await.unwrap();

    let err = ParticipantRepo::add(&pool, campaign.id, 11, None).await.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(
                db_err.constraint(),
                Some("uq_campaign_participants_campaign_user")
            );
        }
        other => panic!("expected database error, got {other:?}"),
    }
    assert_eq!(ParticipantRepo::count(&pool, campaign.id).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn seats_toggle_ready_and_leave(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Bespin Heist")).await.unwrap();
    let character = CharacterRepo::create(&pool, 11, &new_character("Lando")).await.unwrap();
    let seat = ParticipantRepo::add(&pool, campaign.id, 11, Some(character.id)).await.unwrap();
    assert_eq!(seat.character_id, Some(character.id));

    let ready = ParticipantRepo::set_ready(&pool, campaign.id, 11, true).await.unwrap();
    assert!(ready.is_ready);

    assert!(ParticipantRepo::remove(&pool, campaign.id, 11).await.unwrap());
    assert!(!ParticipantRepo::remove(&pool, campaign.id, 11).await.unwrap());
    assert_eq!(ParticipantRepo::count(&pool, campaign.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_to_seats_and_messages(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Jedha")).await.unwrap();
    CampaignMessageRepo::create(&pool, campaign.id, Some(10), &message("chat", "hello"))
        .await
        .unwrap();

    assert!(CampaignRepo::delete(&pool, campaign.id).await.unwrap());
    assert!(ParticipantRepo::list(&pool, campaign.id).await.unwrap().is_empty());
    assert!(CampaignMessageRepo::list(&pool, campaign.id, 50, None)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn location_updates_campaign(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Mos Eisley")).await.unwrap();
    let moved = CampaignRepo::set_location(&pool, campaign.id, "Cantina", Some("https://i/c"))
        .await
        .unwrap();
    assert_eq!(moved.current_location.as_deref(), Some("Cantina"));
    assert!(moved.last_activity >= campaign.last_activity);

    CampaignRepo::set_game_master(&pool, campaign.id, 10).await.unwrap();
    CampaignRepo::clear_game_master(&pool, campaign.id).await.unwrap();
    let cleared = CampaignRepo::find_by_id(&pool, campaign.id).await.unwrap().unwrap();
    assert!(cleared.game_master_id.is_none());
}

// ---------------------------------------------------------------------------
// Test: messages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn message_pages_are_oldest_first(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Scarif")).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..5 {
        let msg = CampaignMessageRepo::create(
            &pool,
            campaign.id,
            Some(10),
            &message("chat", &format!("line {i}")),
        )
        .await
        .unwrap();
        ids.push(msg.id);
    }
    let system = CampaignMessageRepo::create(&pool, campaign.id, None, &message("system", "joined"))
        .await
        .unwrap();
    assert!(system.user_id.is_none());
    assert_eq!(system.extra_data, json!({}));

    let newest = CampaignMessageRepo::list(&pool, campaign.id, 3, None).await.unwrap();
    let contents: Vec<&str> = newest.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["line 3", "line 4", "joined"]);

    let older = CampaignMessageRepo::list(&pool, campaign.id, 3, Some(ids[3])).await.unwrap();
    let contents: Vec<&str> = older.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["line 0", "line 1", "line 2"]);
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_grants_stack_up_to_the_cap(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Jakku")).await.unwrap();

    let first = InventoryRepo::add(&pool, campaign.id, None, 10, &item(11, "Medpac", "items", 2))
        .await
        .unwrap();
    assert_eq!(first.quantity, 2);
    assert_eq!(first.added_by_gm_id, Some(10));

    let second = InventoryRepo::add(&pool, campaign.id, None, 10, &item(11, " Medpac ", "items", 3))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.quantity, 5);

    let capped = InventoryRepo::add(&pool, campaign.id, None, 10, &item(11, "Medpac", "items", 999))
        .await
        .unwrap();
    assert_eq!(capped.quantity, 999);

    let other_player = InventoryRepo::add(&pool, campaign.id, None, 10, &item(12, "Medpac", "items", 1))
        .await
        .unwrap();
    assert_ne!(other_player.id, first.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inventory_lists_are_scoped_by_campaign_and_player(pool: PgPool) {
    let hoth = CampaignRepo::create(&pool, 10, &new_campaign("Hoth")).await.unwrap();
    let endor = CampaignRepo::create(&pool, 10, &new_campaign("Endor")).await.unwrap();

    InventoryRepo::add(&pool, hoth.id, None, 10, &item(11, "Blaster", "weapons", 1)).await.unwrap();
    InventoryRepo::add(&pool, hoth.id, None, 10, &item(11, "Speeder", "vehicles", 1)).await.unwrap();
    InventoryRepo::add(&pool, hoth.id, None, 10, &item(12, "Helmet", "armor", 1)).await.unwrap();
    let foreign = InventoryRepo::add(&pool, endor.id, None, 10, &item(11, "Glider", "vehicles", 1))
        .await
        .unwrap();

    let mine = InventoryRepo::list_for_user(&pool, hoth.id, 11).await.unwrap();
    let names: Vec<&str> = mine.iter().map(|i| i.item_name.as_str()).collect();
    assert_eq!(names, vec!["Speeder", "Blaster"]);

    assert_eq!(InventoryRepo::list_for_campaign(&pool, hoth.id).await.unwrap().len(), 3);

    let mut counts = InventoryRepo::counts_for_campaign(&pool, hoth.id).await.unwrap();
    counts.sort_by_key(|c| c.user_id);
    assert_eq!(counts.len(), 2);
    assert_eq!((counts[0].user_id, counts[0].item_count), (11, 2));
    assert_eq!((counts[1].user_id, counts[1].item_count), (12, 1));

    assert!(InventoryRepo::find(&pool, hoth.id, foreign.id).await.unwrap().is_none());
    assert!(InventoryRepo::update(&pool, hoth.id, foreign.id, Some(3), None).await.unwrap().is_none());
    assert!(!InventoryRepo::delete(&pool, hoth.id, foreign.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inventory_update_keeps_absent_fields(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Bespin")).await.unwrap();
    let added = InventoryRepo::add(&pool, campaign.id, None, 10, &item(11, "Carbonite", "items", 4))
        .await
        .unwrap();

    let noted = InventoryRepo::update(&pool, campaign.id, added.id, None, Some("Frozen solid"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(noted.quantity, 4);
    assert_eq!(noted.notes.as_deref(), Some("Frozen solid"));

    let fewer = InventoryRepo::update(&pool, campaign.id, added.id, Some(1), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fewer.quantity, 1);
    assert_eq!(fewer.notes.as_deref(), Some("Frozen solid"));

    assert!(InventoryRepo::delete(&pool, campaign.id, added.id).await.unwrap());
    assert!(InventoryRepo::find(&pool, campaign.id, added.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_campaign_drops_its_inventory(pool: PgPool) {
    let campaign = CampaignRepo::create(&pool, 10, &new_campaign("Alderaan")).await.unwrap();
    InventoryRepo::add(&pool, campaign.id, None, 10, &item(11, "Datapad", "items", 1)).await.unwrap();

    assert!(CampaignRepo::delete(&pool, campaign.id).await.unwrap());
    assert!(InventoryRepo::list_for_campaign(&pool, campaign.id).await.unwrap().is_empty());
}
