//! Integration tests for the universe, timeline, scene, character and tag
//! repositories against a real database:
//! - Canon exclusivity within a universe
//! - Scene ordering on insert, delete and reorder
//! - Association sync and search filters
//! - Cascades and unique constraints

use assert_matches::assert_matches;
use sqlx::PgPool;
use storyverse_core::ordering::{is_contiguous, reorder};
use storyverse_db::models::character::CreateCharacter;
use storyverse_db::models::scene::{CreateScene, SceneSearchParams, UpdateScene};
use storyverse_db::models::tag::CreateTag;
use storyverse_db::models::timeline::{CreateTimeline, UpdateTimeline};
use storyverse_db::models::universe::{CreateUniverse, UpdateUniverse};
use storyverse_db::models::user::CreateUser;
use storyverse_db::repositories::{
    CharacterRepo, SceneRepo, TagRepo, TimelineRepo, UniverseRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, name: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_universe(pool: &PgPool, user_id: i64, name: &str) -> i64 {
    UniverseRepo::create(
        pool,
        user_id,
        &CreateUniverse {
            name: name.to_string(),
            description: None,
            cover_image: None,
            is_public: None,
            allow_fork: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_timeline(name: &str, is_canon: bool) -> CreateTimeline {
    CreateTimeline {
        name: name.to_string(),
        description: None,
        color: None,
        is_canon: Some(is_canon),
        branch_from_id: None,
    }
}

fn new_scene(title: &str) -> CreateScene {
    CreateScene {
        title: title.to_string(),
        ..CreateScene::default()
    }
}

async fn orders(pool: &PgPool, timeline_id: i64) -> Vec<(String, i32)> {
    SceneRepo::list_by_timeline(pool, timeline_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| (s.scene.title, s.scene.order))
        .collect()
}

// ---------------------------------------------------------------------------
// Universes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn universe_defaults_and_partial_update(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;

    let universe = UniverseRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(!universe.is_public);
    assert!(!universe.allow_fork);
    assert_eq!(universe.fork_count, 0);

    let updated = UniverseRepo::update(
        &pool,
        id,
        &UpdateUniverse {
            is_public: Some(true),
            ..UpdateUniverse::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(updated.is_public);
    assert_eq!(updated.name, "Saga");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_for_user_counts_children(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    CharacterRepo::create(
        &pool,
        id,
        &CreateCharacter {
            name: "Rania".to_string(),
            ..CreateCharacter::default()
        },
    )
    .await
    .unwrap();

    let listed = UniverseRepo::list_for_user(&pool, user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].timelines_count, 1);
    assert_eq!(listed[0].characters_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_universe_cascades(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    let scene = SceneRepo::create(&pool, timeline.id, &new_scene("Opening"))
        .await
        .unwrap();

    assert!(UniverseRepo::delete(&pool, id).await.unwrap());
    assert!(TimelineRepo::find_by_id(&pool, timeline.id)
        .await
        .unwrap()
        .is_none());
    assert!(SceneRepo::find_by_id(&pool, scene.scene.id)
        .await
        .unwrap()
        .is_none());
    assert!(!UniverseRepo::delete(&pool, id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Timelines
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn at_most_one_canon_timeline(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;

    let first = TimelineRepo::create(&pool, id, &new_timeline("First", true))
        .await
        .unwrap();
    let second = TimelineRepo::create(&pool, id, &new_timeline("Second", true))
        .await
        .unwrap();
    let third = TimelineRepo::create(&pool, id, &new_timeline("Third", false))
        .await
        .unwrap();

    let first = TimelineRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert!(!first.is_canon);
    assert!(second.is_canon);

    TimelineRepo::update(
        &pool,
        third.id,
        &UpdateTimeline {
            is_canon: Some(true),
            ..UpdateTimeline::default()
        },
    )
    .await
    .unwrap();

    let listed = TimelineRepo::list_by_universe(&pool, id).await.unwrap();
    let canon: Vec<&str> = listed
        .iter()
        .filter(|t| t.timeline.is_canon)
        .map(|t| t.timeline.name.as_str())
        .collect();
    assert_eq!(canon, vec!["Third"]);
    assert_eq!(listed[0].timeline.name, "Third");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn timeline_default_color(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", false))
        .await
        .unwrap();
    assert_eq!(timeline.color, "#1CB0F6");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_origin_scene_detaches_branch(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let main = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    let origin = SceneRepo::create(&pool, main.id, &new_scene("Fork in the road"))
        .await
        .unwrap();
    let branch = TimelineRepo::create(
        &pool,
        id,
        &CreateTimeline {
            branch_from_id: Some(origin.scene.id),
            ..new_timeline("What if", false)
        },
    )
    .await
    .unwrap();

    SceneRepo::delete(&pool, origin.scene.id).await.unwrap();

    let branch = TimelineRepo::find_by_id(&pool, branch.id).await.unwrap().unwrap();
    assert_eq!(branch.branch_from_id, None);
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn scenes_append_and_renumber_on_delete(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for title in ["A", "B", "C", "D"] {
        ids.push(
            SceneRepo::create(&pool, timeline.id, &new_scene(title))
                .await
                .unwrap()
                .scene
                .id,
        );
    }
    assert_eq!(
        orders(&pool, timeline.id).await,
        vec![
            ("A".to_string(), 1),
            ("B".to_string(), 2),
            ("C".to_string(), 3),
            ("D".to_string(), 4)
        ]
    );

    assert!(SceneRepo::delete(&pool, ids[1]).await.unwrap());
    assert_eq!(
        orders(&pool, timeline.id).await,
        vec![
            ("A".to_string(), 1),
            ("C".to_string(), 2),
            ("D".to_string(), 3)
        ]
    );
    let slots = SceneRepo::slots(&pool, timeline.id).await.unwrap();
    assert!(is_contiguous(&slots));

    assert!(!SceneRepo::delete(&pool, ids[1]).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reorder_applies_permutation(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        ids.push(
            SceneRepo::create(&pool, timeline.id, &new_scene(title))
                .await
                .unwrap()
                .scene
                .id,
        );
    }

    let existing: Vec<i64> = SceneRepo::slots(&pool, timeline.id)
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    let assignments = reorder(&existing, &[ids[2], ids[0], ids[1]]).unwrap();
    SceneRepo::apply_orders(&pool, timeline.id, &assignments)
        .await
        .unwrap();

    assert_eq!(
        orders(&pool, timeline.id).await,
        vec![
            ("C".to_string(), 1),
            ("A".to_string(), 2),
            ("B".to_string(), 3)
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn word_count_follows_content(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    let created = SceneRepo::create(
        &pool,
        timeline.id,
        &CreateScene {
            content: Some("<p>One two three</p>".to_string()),
            ..new_scene("Counted")
        },
    )
    .await
    .unwrap();
    assert_eq!(created.scene.word_count, 3);

    let updated = SceneRepo::update(
        &pool,
        created.scene.id,
        &UpdateScene {
            content: Some(Some("<p>Just two</p>".to_string())),
            ..UpdateScene::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.word_count, 2);

    let retitled = SceneRepo::update(
        &pool,
        created.scene.id,
        &UpdateScene {
            title: Some("Renamed".to_string()),
            ..UpdateScene::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(retitled.word_count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn associations_sync_and_neighbors(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    let rania = CharacterRepo::create(
        &pool,
        id,
        &CreateCharacter {
            name: "Rania".to_string(),
            nickname: Some("Ran".to_string()),
            ..CreateCharacter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(rania.display_name, "Ran");
    let tag = TagRepo::create(
        &pool,
        id,
        &CreateTag {
            name: "Train".to_string(),
            ..CreateTag::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(tag.category, "other");

    let first = SceneRepo::create(&pool, timeline.id, &new_scene("First"))
        .await
        .unwrap();
    let second = SceneRepo::create(
        &pool,
        timeline.id,
        &CreateScene {
            character_ids: Some(vec![rania.id]),
            tag_ids: Some(vec![tag.id]),
            ..new_scene("Second")
        },
    )
    .await
    .unwrap();
    assert_eq!(second.character_ids, vec![rania.id]);

    let (previous, next) = SceneRepo::neighbors(&pool, &second.scene).await.unwrap();
    assert_eq!(previous.map(|s| s.id), Some(first.scene.id));
    assert!(next.is_none());

    let appearances = CharacterRepo::appearances(&pool, rania.id).await.unwrap();
    assert_eq!(appearances.len(), 1);
    assert_eq!(appearances[0].timeline_name, "Main");

    SceneRepo::update(
        &pool,
        second.scene.id,
        &UpdateScene {
            character_ids: Some(vec![]),
            ..UpdateScene::default()
        },
    )
    .await
    .unwrap();
    let reloaded = SceneRepo::find_with_relations(&pool, second.scene.id)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.character_ids.is_empty());
    assert_eq!(reloaded.tag_ids, vec![tag.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_filters_combine(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let timeline = TimelineRepo::create(&pool, id, &new_timeline("Main", true))
        .await
        .unwrap();
    let tag = TagRepo::create(
        &pool,
        id,
        &CreateTag {
            name: "Rain".to_string(),
            ..CreateTag::default()
        },
    )
    .await
    .unwrap();

    SceneRepo::create(
        &pool,
        timeline.id,
        &CreateScene {
            content: Some("The train leaves at dawn".to_string()),
            mood: Some("sad".to_string()),
            tag_ids: Some(vec![tag.id]),
            ..new_scene("Departure")
        },
    )
    .await
    .unwrap();
    SceneRepo::create(
        &pool,
        timeline.id,
        &CreateScene {
            location: Some("Train Station".to_string()),
            mood: Some("happy".to_string()),
            ..new_scene("Arrival")
        },
    )
    .await
    .unwrap();

    let by_text = SceneRepo::search(
        &pool,
        id,
        &SceneSearchParams {
            query: Some("TRAIN".to_string()),
            ..SceneSearchParams::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_text.len(), 2);
    assert_eq!(by_text[0].timeline_name, "Main");

    let by_tag_and_mood = SceneRepo::search(
        &pool,
        id,
        &SceneSearchParams {
            tag_ids: vec![tag.id],
            mood: Some("sad".to_string()),
            ..SceneSearchParams::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_tag_and_mood.len(), 1);
    assert_eq!(by_tag_and_mood[0].scene.title, "Departure");

    let sorted = SceneRepo::search(
        &pool,
        id,
        &SceneSearchParams {
            sort: Some("title".to_string()),
            sort_dir: Some("desc".to_string()),
            limit: Some(1),
            ..SceneSearchParams::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].scene.title, "Departure");

    let literal = SceneRepo::search(
        &pool,
        id,
        &SceneSearchParams {
            query: Some("%".to_string()),
            ..SceneSearchParams::default()
        },
    )
    .await
    .unwrap();
    assert!(literal.is_empty());

    let moods = SceneRepo::distinct_moods(&pool, id).await.unwrap();
    assert_eq!(moods, vec!["happy", "sad"]);
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_tag_name_violates_unique(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let id = new_universe(&pool, user, "Saga").await;
    let input = CreateTag {
        name: "Dup".to_string(),
        ..CreateTag::default()
    };
    TagRepo::create(&pool, id, &input).await.unwrap();

    let err = TagRepo::create(&pool, id, &input).await.unwrap_err();
    assert_matches!(
        err,
        sqlx::Error::Database(ref db) if db.constraint() == Some("uq_tags_universe_id_name")
    );

    let (existing, created) = TagRepo::find_or_create(&pool, id, "Dup").await.unwrap();
    assert!(!created);
    assert_eq!(existing.name, "Dup");
    let (_, created) = TagRepo::find_or_create(&pool, id, "Fresh").await.unwrap();
    assert!(created);

    let other = new_universe(&pool, user, "Other").await;
    TagRepo::create(&pool, other, &input).await.unwrap();
}
