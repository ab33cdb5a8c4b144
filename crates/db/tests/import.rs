//! Integration tests for text import, manuscript ingestion and export loading.

use sqlx::PgPool;
use storyverse_core::importer::manuscript::{TimelineKey, MAMA_BRANCH_QUESTION};
use storyverse_core::importer::parse;
use storyverse_core::importer::text_parser::palette_color;
use storyverse_db::models::import::ImportRequest;
use storyverse_db::models::tag::CreateTag;
use storyverse_db::models::universe::CreateUniverse;
use storyverse_db::models::user::CreateUser;
use storyverse_db::repositories::{
    ExportRepo, ImportRepo, ManuscriptRepo, SceneRepo, TagRepo, TimelineRepo, UniverseRepo,
    UserRepo,
};

const TEXT: &str = "🚂 Bandung → Garut
INFJ: Kereta pertama jam 7 pagi?
INFP: Oke, sayang.
🎬 Scene 2: Goodbye at the station
Inner monologue INFP: \"Bagaimana kalau aku tidak pergi?\"";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "writer".to_string(),
            email: "writer@example.com".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_universe(pool: &PgPool, user_id: i64) -> i64 {
    UniverseRepo::create(
        pool,
        user_id,
        &CreateUniverse {
            name: "Imports".to_string(),
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

fn request(name: &str) -> ImportRequest {
    ImportRequest {
        content: TEXT.to_string(),
        timeline_name: name.to_string(),
        description: None,
        color: None,
        is_canon: true,
        create_characters: true,
        create_tags: true,
    }
}

fn padded(text: &str) -> String {
    format!("{text} and the evening keeps going without any hurry at all")
}

fn manuscript() -> String {
    [
        "🚂 Departure".to_string(),
        padded("INFJ: resign from the office tomorrow"),
        "🏠 Dinner".to_string(),
        padded("Rania and Mama argue about dinner"),
        "🏠 Short".to_string(),
        "tiny".to_string(),
        "🏠 Retry".to_string(),
        padded("Rania and Mama (healthy version) talk it through"),
    ]
    .join("\n")
}

// ---------------------------------------------------------------------------
// Text import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn text_import_creates_timeline_and_reuses_tags(pool: PgPool) {
    let user = new_user(&pool).await;
    let universe = new_universe(&pool, user).await;
    let existing = TagRepo::create(
        &pool,
        universe,
        &CreateTag {
            name: "BANDUNG".to_string(),
            ..CreateTag::default()
        },
    )
    .await
    .unwrap();

    let scenes = parse(TEXT);
    assert_eq!(scenes.len(), 2);
    let result = ImportRepo::commit(&pool, universe, &request("Imported"), &scenes)
        .await
        .unwrap();

    assert_eq!(result.scenes_count, 2);
    assert_eq!(result.characters_count, 2);
    assert!(result.timeline.is_canon);
    assert_eq!(result.timeline.color, "#1CB0F6");

    let stored = SceneRepo::list_by_timeline(&pool, result.timeline.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].scene.order, 1);
    assert_eq!(stored[0].scene.location.as_deref(), Some("Bandung"));
    assert!(stored[0].tag_ids.contains(&existing.id));
    assert!(stored[0].scene.word_count > 0);
    assert!(stored[1].scene.is_branch_point);

    let tags = TagRepo::list_by_universe(&pool, universe).await.unwrap();
    let bandung: Vec<_> = tags
        .iter()
        .filter(|t| t.tag.name.eq_ignore_ascii_case("bandung"))
        .collect();
    assert_eq!(bandung.len(), 1);
    let garut = tags.iter().find(|t| t.tag.name == "Garut").unwrap();
    assert_eq!(garut.tag.category, "location");

    let created_colors: Vec<Option<String>> = sqlx::query_scalar(
        "SELECT color FROM tags WHERE universe_id = $1 AND id <> $2 ORDER BY id",
    )
    .bind(universe)
    .bind(existing.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(!created_colors.is_empty());
    for (i, color) in created_colors.iter().enumerate() {
        assert_eq!(color.as_deref(), Some(palette_color(i)));
    }

    // A second import reuses the characters and moves the canon flag.
    let again = ImportRepo::commit(&pool, universe, &request("Again"), &scenes)
        .await
        .unwrap();
    assert_eq!(again.characters_count, 2);
    let characters: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM characters WHERE universe_id = $1")
            .bind(universe)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(characters, 2);
    let first = TimelineRepo::find_by_id(&pool, result.timeline.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!first.is_canon);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn text_import_without_characters_or_tags(pool: PgPool) {
    let user = new_user(&pool).await;
    let universe = new_universe(&pool, user).await;
    let scenes = parse(TEXT);
    let request = ImportRequest {
        create_characters: false,
        create_tags: false,
        ..request("Bare")
    };

    let result = ImportRepo::commit(&pool, universe, &request, &scenes)
        .await
        .unwrap();

    assert_eq!(result.characters_count, 0);
    assert_eq!(result.tags_count, 0);
    assert!(TagRepo::list_by_universe(&pool, universe)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Manuscript
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn manuscript_dry_run_rolls_back(pool: PgPool) {
    let user = new_user(&pool).await;

    let outcome = ManuscriptRepo::ingest(&pool, user, &manuscript(), true).await;

    assert!(outcome.success);
    assert_eq!(outcome.universe_id, None);
    assert_eq!(outcome.stats.scenes_imported, 3);
    assert_eq!(outcome.stats.scenes_skipped, 1);
    assert!(outcome.log.contains("DRY RUN - All changes rolled back"));
    assert!(outcome.log.contains("Skipped short scene at line 5"));

    let universes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM universes")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(universes, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manuscript_live_import_and_branch_linking(pool: PgPool) {
    let user = new_user(&pool).await;

    let outcome = ManuscriptRepo::ingest(&pool, user, &manuscript(), false).await;
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.stats.universes_created, 1);
    assert_eq!(outcome.stats.timelines_created, 5);
    assert_eq!(outcome.stats.characters_created, 21);
    assert_eq!(outcome.stats.tags_created, 11);
    assert!(outcome.log.contains("Import completed successfully"));
    let universe = outcome.universe_id.unwrap();

    let timelines = TimelineRepo::list_by_universe(&pool, universe).await.unwrap();
    let count_of = |key: TimelineKey| {
        timelines
            .iter()
            .find(|t| t.timeline.name == key.name())
            .map(|t| t.scenes_count)
            .unwrap()
    };
    assert_eq!(count_of(TimelineKey::Primary), 1);
    assert_eq!(count_of(TimelineKey::RaniaMamaOriginal), 1);
    assert_eq!(count_of(TimelineKey::RaniaMamaHealthy), 1);

    let report = ManuscriptRepo::link_branch_points(&pool, universe)
        .await
        .unwrap();
    assert!(report.flagged.contains(&"Dinner".to_string()));
    assert!(report.flagged.contains(&"Departure".to_string()));
    assert_eq!(report.linked, vec![TimelineKey::RaniaMamaHealthy.name()]);
    assert_eq!(report.branch_points, 2);
    assert_eq!(report.branched_timelines, 1);

    let dinner = SceneRepo::search(
        &pool,
        universe,
        &storyverse_db::models::scene::SceneSearchParams {
            query: Some("argue".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(
        dinner[0].scene.branch_question.as_deref(),
        Some(MAMA_BRANCH_QUESTION)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manuscript_missing_file_reports_failure(pool: PgPool) {
    let user = new_user(&pool).await;
    let outcome = ManuscriptRepo::ingest_file(
        &pool,
        user,
        std::path::Path::new("/nonexistent/raw.md"),
        false,
    )
    .await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("/nonexistent/raw.md"));
    assert_eq!(outcome.stats.errors, 1);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn export_resolves_names(pool: PgPool) {
    let user = new_user(&pool).await;
    let universe_id = new_universe(&pool, user).await;
    let scenes = parse(TEXT);
    ImportRepo::commit(&pool, universe_id, &request("Imported"), &scenes)
        .await
        .unwrap();

    let universe = UniverseRepo::find_by_id(&pool, universe_id)
        .await
        .unwrap()
        .unwrap();
    let export = ExportRepo::universe(&pool, &universe).await.unwrap();

    assert_eq!(export.universe.name, "Imports");
    assert_eq!(export.characters.len(), 2);
    assert_eq!(export.timelines.len(), 1);
    let first = &export.timelines[0].scenes[0];
    assert_eq!(first.order, 1);
    assert_eq!(first.characters, vec!["INFJ", "INFP"]);
    assert!(first.tags.contains(&"Bandung".to_string()));
}
