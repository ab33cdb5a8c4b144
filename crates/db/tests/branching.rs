//! Integration tests for branch creation and universe forking.

use sqlx::PgPool;
use storyverse_core::branching::ancestry;
use storyverse_db::models::character::CreateCharacter;
use storyverse_db::models::scene::{CreateBranch, CreateScene};
use storyverse_db::models::tag::CreateTag;
use storyverse_db::models::timeline::CreateTimeline;
use storyverse_db::models::universe::CreateUniverse;
use storyverse_db::models::user::CreateUser;
use storyverse_db::repositories::{
    BranchRepo, CharacterRepo, ForkRepo, SceneRepo, TagRepo, TimelineRepo, UniverseRepo, UserRepo,
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

async fn public_universe(pool: &PgPool, user_id: i64) -> i64 {
    UniverseRepo::create(
        pool,
        user_id,
        &CreateUniverse {
            name: "Saga".to_string(),
            description: Some("A story".to_string()),
            cover_image: None,
            is_public: Some(true),
            allow_fork: Some(true),
        },
    )
    .await
    .unwrap()
    .id
}

async fn timeline(pool: &PgPool, universe_id: i64, name: &str, is_canon: bool) -> i64 {
    TimelineRepo::create(
        pool,
        universe_id,
        &CreateTimeline {
            name: name.to_string(),
            description: None,
            color: None,
            is_canon: Some(is_canon),
            branch_from_id: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn scene(pool: &PgPool, timeline_id: i64, title: &str, tag_ids: Vec<i64>) -> i64 {
    SceneRepo::create(
        pool,
        timeline_id,
        &CreateScene {
            title: title.to_string(),
            content: Some(format!("<p>{title} happens here</p>")),
            tag_ids: Some(tag_ids),
            ..CreateScene::default()
        },
    )
    .await
    .unwrap()
    .scene
    .id
}

fn branch(name: &str, copy: bool) -> CreateBranch {
    CreateBranch {
        name: name.to_string(),
        copy_subsequent_scenes: copy,
        ..CreateBranch::default()
    }
}

// ---------------------------------------------------------------------------
// Branching
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn branch_copies_later_scenes_in_order(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let universe = public_universe(&pool, user).await;
    let main = timeline(&pool, universe, "Main", true).await;
    let tag = TagRepo::create(
        &pool,
        universe,
        &CreateTag {
            name: "Rain".to_string(),
            ..CreateTag::default()
        },
    )
    .await
    .unwrap();

    let mut ids = Vec::new();
    for title in ["One", "Two", "Three", "Four", "Five"] {
        ids.push(scene(&pool, main, title, vec![tag.id]).await);
    }
    let source = SceneRepo::find_by_id(&pool, ids[1]).await.unwrap().unwrap();

    let outcome = BranchRepo::create_branch(&pool, universe, &source, &branch("What if", true))
        .await
        .unwrap();

    assert_eq!(outcome.copied_scenes, 3);
    assert_eq!(outcome.timeline.color, "#F59E0B");
    assert!(!outcome.timeline.is_canon);
    assert_eq!(outcome.timeline.branch_from_id, Some(source.id));

    let copied = SceneRepo::list_by_timeline(&pool, outcome.timeline.id)
        .await
        .unwrap();
    let titles: Vec<(&str, i32)> = copied
        .iter()
        .map(|s| (s.scene.title.as_str(), s.scene.order))
        .collect();
    assert_eq!(titles, vec![("Three", 1), ("Four", 2), ("Five", 3)]);
    assert!(copied.iter().all(|s| s.tag_ids == vec![tag.id]));
    assert!(copied.iter().all(|s| s.scene.word_count == 3));

    let source = SceneRepo::find_by_id(&pool, ids[1]).await.unwrap().unwrap();
    assert!(source.is_branch_point);

    let branches = TimelineRepo::list_branches_of_scene(&pool, source.id)
        .await
        .unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].branch_from_timeline_id, Some(main));
    assert_eq!(branches[0].scenes_count, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn branch_without_copy_is_empty(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let universe = public_universe(&pool, user).await;
    let main = timeline(&pool, universe, "Main", true).await;
    let only = scene(&pool, main, "Only", vec![]).await;
    let source = SceneRepo::find_by_id(&pool, only).await.unwrap().unwrap();

    let outcome = BranchRepo::create_branch(&pool, universe, &source, &branch("Empty", false))
        .await
        .unwrap();

    assert_eq!(outcome.copied_scenes, 0);
    assert!(SceneRepo::list_by_timeline(&pool, outcome.timeline.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ancestry_walks_to_root(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let universe = public_universe(&pool, user).await;
    let main = timeline(&pool, universe, "Main", true).await;
    let first = scene(&pool, main, "First", vec![]).await;
    let first = SceneRepo::find_by_id(&pool, first).await.unwrap().unwrap();
    let child = BranchRepo::create_branch(&pool, universe, &first, &branch("Child", false))
        .await
        .unwrap()
        .timeline;
    let child_scene = scene(&pool, child.id, "Child scene", vec![]).await;
    let child_scene = SceneRepo::find_by_id(&pool, child_scene)
        .await
        .unwrap()
        .unwrap();
    let grandchild =
        BranchRepo::create_branch(&pool, universe, &child_scene, &branch("Grandchild", false))
            .await
            .unwrap()
            .timeline;

    let links = TimelineRepo::branch_links(&pool, universe).await.unwrap();
    let walk = ancestry(grandchild.id, &links);

    assert!(!walk.cyclic);
    let path: Vec<i64> = walk.steps.iter().map(|s| s.timeline_id).collect();
    assert_eq!(path, vec![grandchild.id, child.id, main]);
}

// ---------------------------------------------------------------------------
// Forking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn fork_deep_copies_and_counts(pool: PgPool) {
    let owner = new_user(&pool, "alice").await;
    let forker = new_user(&pool, "bob").await;
    let universe = public_universe(&pool, owner).await;
    let main = timeline(&pool, universe, "Main", true).await;
    let tag = TagRepo::create(
        &pool,
        universe,
        &CreateTag {
            name: "Rain".to_string(),
            ..CreateTag::default()
        },
    )
    .await
    .unwrap();
    let rania = CharacterRepo::create(
        &pool,
        universe,
        &CreateCharacter {
            name: "Rania".to_string(),
            traits: Some(vec!["curious".to_string()]),
            ..CreateCharacter::default()
        },
    )
    .await
    .unwrap();
    let origin = SceneRepo::create(
        &pool,
        main,
        &CreateScene {
            title: "Origin".to_string(),
            character_ids: Some(vec![rania.id]),
            tag_ids: Some(vec![tag.id]),
            ..CreateScene::default()
        },
    )
    .await
    .unwrap();
    scene(&pool, main, "Later", vec![]).await;
    BranchRepo::create_branch(&pool, universe, &origin.scene, &branch("Alt", true))
        .await
        .unwrap();

    let source = UniverseRepo::find_by_id(&pool, universe).await.unwrap().unwrap();
    let fork = ForkRepo::fork(&pool, &source, forker).await.unwrap();

    assert_eq!(fork.name, "Saga (Fork)");
    assert_eq!(fork.user_id, forker);
    assert!(!fork.is_public);
    assert!(!fork.allow_fork);
    assert_eq!(fork.forked_from_id, Some(universe));

    let source = UniverseRepo::find_by_id(&pool, universe).await.unwrap().unwrap();
    assert_eq!(source.fork_count, 1);

    let count = |table: &'static str, id: i64| {
        let pool = pool.clone();
        async move {
            let query = match table {
                "timelines" => "SELECT COUNT(*) FROM timelines WHERE universe_id = $1",
                "characters" => "SELECT COUNT(*) FROM characters WHERE universe_id = $1",
                "tags" => "SELECT COUNT(*) FROM tags WHERE universe_id = $1",
                _ => {
                    "SELECT COUNT(*) FROM scenes s JOIN timelines t ON t.id = s.timeline_id
                     WHERE t.universe_id = $1"
                }
            };
            sqlx::query_scalar::<_, i64>(query)
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap()
        }
    };
    for table in ["timelines", "characters", "tags", "scenes"] {
        assert_eq!(
            count(table, fork.id).await,
            count(table, universe).await,
            "{table} count differs"
        );
    }

    // Associations and the branch origin point into the fork.
    let forked_timelines = TimelineRepo::list_by_universe(&pool, fork.id).await.unwrap();
    let canon = forked_timelines
        .iter()
        .find(|t| t.timeline.is_canon)
        .unwrap();
    assert_eq!(canon.timeline.name, "Main");
    let alt = forked_timelines
        .iter()
        .find(|t| t.timeline.name == "Alt")
        .unwrap();
    assert_eq!(alt.branch_from_timeline_id, Some(canon.timeline.id));

    let forked_scenes = SceneRepo::list_by_timeline(&pool, canon.timeline.id)
        .await
        .unwrap();
    let forked_origin = &forked_scenes[0];
    assert_eq!(forked_origin.scene.title, "Origin");
    assert_eq!(alt.timeline.branch_from_id, Some(forked_origin.scene.id));
    assert_eq!(forked_origin.character_ids.len(), 1);
    assert_ne!(forked_origin.character_ids[0], rania.id);
    let forked_character = CharacterRepo::find_by_id(&pool, forked_origin.character_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forked_character.universe_id, fork.id);
    assert_eq!(forked_character.traits.0, vec!["curious".to_string()]);
}
