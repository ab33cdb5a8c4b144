//! File-based manuscript ingestion and branch-point linking.
//!
//! Ingestion seeds a fixed universe, then persists every planned scene.
//! The whole run is one transaction: a dry run or any failure rolls it back.

use std::collections::HashMap;
use std::path::Path;

use sqlx::PgPool;
use storyverse_core::importer::manuscript::{
    self, character_seeds, TimelineKey, MAMA_BRANCH_QUESTION, MBTI_BRANCH_OFFSET,
    MBTI_BRANCH_QUESTION, PRIMARY_BRANCH_KEYWORDS, PROGRESS_INTERVAL, TAG_SEEDS,
    UNIVERSE_DESCRIPTION, UNIVERSE_NAME,
};
use storyverse_core::types::DbId;

use crate::models::manuscript::{BranchLinkReport, ImportLog, ManuscriptOutcome, ManuscriptStats};
use crate::repositories::character_repo::CharacterFields;
use crate::repositories::scene_repo::SceneFields;
use crate::repositories::{CharacterRepo, SceneRepo, TagRepo, TimelineRepo};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

pub struct ManuscriptRepo;

impl ManuscriptRepo {
    /// Read the manuscript at `path` and ingest it for `user_id`.
    ///
    /// Never fails: errors are reported through the outcome.
    pub async fn ingest_file(
        pool: &PgPool,
        user_id: DbId,
        path: &Path,
        dry_run: bool,
    ) -> ManuscriptOutcome {
        let mut log = ImportLog::default();
        log.push(format!("Starting import from {}", path.display()));
        match std::fs::read_to_string(path) {
            Ok(input) => Self::ingest_logged(pool, user_id, &input, dry_run, log).await,
            Err(e) => {
                let message = format!("File not found: {} ({e})", path.display());
                log.push(format!("ERROR: {message}"));
                ManuscriptOutcome {
                    success: false,
                    error: Some(message),
                    stats: ManuscriptStats {
                        errors: 1,
                        ..ManuscriptStats::default()
                    },
                    log,
                    universe_id: None,
                }
            }
        }
    }

    /// Ingest manuscript text for `user_id`.
    pub async fn ingest(
        pool: &PgPool,
        user_id: DbId,
        input: &str,
        dry_run: bool,
    ) -> ManuscriptOutcome {
        Self::ingest_logged(pool, user_id, input, dry_run, ImportLog::default()).await
    }

    async fn ingest_logged(
        pool: &PgPool,
        user_id: DbId,
        input: &str,
        dry_run: bool,
        mut log: ImportLog,
    ) -> ManuscriptOutcome {
        log.push(format!("Mode: {}", if dry_run { "DRY RUN" } else { "LIVE" }));
        let mut stats = ManuscriptStats::default();

        match Self::run(pool, user_id, input, dry_run, &mut stats, &mut log).await {
            Ok(universe_id) => ManuscriptOutcome {
                success: true,
                error: None,
                stats,
                log,
                universe_id,
            },
            Err(e) => {
                tracing::error!(error = %e, user_id, "Manuscript import failed");
                stats.errors += 1;
                log.push(format!("ERROR: {e}"));
                ManuscriptOutcome {
                    success: false,
                    error: Some(e.to_string()),
                    stats,
                    log,
                    universe_id: None,
                }
            }
        }
    }

    /// The transactional body. Returns the universe id when committed.
    async fn run(
        pool: &PgPool,
        user_id: DbId,
        input: &str,
        dry_run: bool,
        stats: &mut ManuscriptStats,
        log: &mut ImportLog,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let universe_id: DbId = sqlx::query_scalar(
            "INSERT INTO universes (user_id, name, description, is_public, allow_fork)
             VALUES ($1, $2, $3, false, true)
             RETURNING id",
        )
        .bind(user_id)
        .bind(UNIVERSE_NAME)
        .bind(UNIVERSE_DESCRIPTION)
        .fetch_one(&mut *tx)
        .await?;
        stats.universes_created = 1;
        log.push(format!("Universe created: {UNIVERSE_NAME} (ID: {universe_id})"));

        let timelines = Self::seed_timelines(&mut tx, universe_id).await?;
        stats.timelines_created = timelines.len();
        log.push(format!("Timelines created: {}", timelines.len()));

        let characters = Self::seed_characters(&mut tx, universe_id).await?;
        stats.characters_created = characters.len();
        log.push(format!("Characters created: {}", characters.len()));

        let tags = Self::seed_tags(&mut tx, universe_id).await?;
        stats.tags_created = tags.len();
        log.push(format!("Tags created: {}", tags.len()));

        let plan = manuscript::plan(input);
        stats.total_lines = plan.total_lines;
        log.push(format!("Parsing complete. Total lines: {}", plan.total_lines));
        for line in &plan.skipped {
            log.push(format!("Skipped short scene at line {line}"));
        }
        stats.scenes_skipped = plan.skipped.len();

        for planned in &plan.scenes {
            let Some(&timeline_id) = timelines.get(&planned.timeline) else {
                continue;
            };
            let fields = SceneFields {
                title: &planned.title,
                content: Some(planned.content.as_str()),
                word_count: planned.word_count,
                ..SceneFields::default()
            };
            let scene = SceneRepo::insert_inner(&mut tx, timeline_id, planned.order, &fields).await?;

            let character_ids: Vec<DbId> = planned
                .characters
                .iter()
                .filter_map(|name| characters.get(name).copied())
                .collect();
            let tag_ids: Vec<DbId> = planned
                .tags
                .iter()
                .filter_map(|name| tags.get(*name).copied())
                .collect();
            SceneRepo::sync_characters_inner(&mut tx, scene.id, &character_ids).await?;
            SceneRepo::sync_tags_inner(&mut tx, scene.id, &tag_ids).await?;

            stats.scenes_imported += 1;
            if stats.scenes_imported % PROGRESS_INTERVAL == 0 {
                log.push(format!("Imported {} scenes...", stats.scenes_imported));
            }
        }
        log.push(format!("Scenes imported: {}", stats.scenes_imported));

        if dry_run {
            tx.rollback().await?;
            log.push("DRY RUN - All changes rolled back");
            Ok(None)
        } else {
            tx.commit().await?;
            log.push("Import completed successfully");
            Ok(Some(universe_id))
        }
    }

    async fn seed_timelines(
        tx: &mut Tx<'_>,
        universe_id: DbId,
    ) -> Result<HashMap<TimelineKey, DbId>, sqlx::Error> {
        let mut ids = HashMap::with_capacity(TimelineKey::ALL.len());
        for key in TimelineKey::ALL {
            let timeline = TimelineRepo::insert_inner(
                tx,
                universe_id,
                key.name(),
                Some(key.description()),
                key.color(),
                key.is_canon(),
                None,
            )
            .await?;
            ids.insert(key, timeline.id);
        }
        Ok(ids)
    }

    async fn seed_characters(
        tx: &mut Tx<'_>,
        universe_id: DbId,
    ) -> Result<HashMap<String, DbId>, sqlx::Error> {
        let seeds = character_seeds();
        let mut ids = HashMap::with_capacity(seeds.len());
        for seed in &seeds {
            let fields = CharacterFields {
                name: &seed.name,
                nickname: seed.nickname,
                kind: seed.kind,
                description: Some(seed.description.as_str()),
                traits: &seed.traits,
                avatar_url: None,
                color: Some(seed.color),
            };
            let id = CharacterRepo::insert_inner(tx, universe_id, &fields).await?;
            ids.insert(seed.name.clone(), id);
        }
        Ok(ids)
    }

    async fn seed_tags(
        tx: &mut Tx<'_>,
        universe_id: DbId,
    ) -> Result<HashMap<&'static str, DbId>, sqlx::Error> {
        let mut ids = HashMap::with_capacity(TAG_SEEDS.len());
        for (name, category, color) in TAG_SEEDS {
            let id =
                TagRepo::insert_inner(tx, universe_id, name, Some(*color), category.as_str()).await?;
            ids.insert(*name, id);
        }
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Branch-point linking
    // -----------------------------------------------------------------------

    /// Flag the manuscript's known decision scenes and connect the derived
    /// timelines to them. Safe to re-run: already flagged scenes are kept.
    pub async fn link_branch_points(
        pool: &PgPool,
        universe_id: DbId,
    ) -> Result<BranchLinkReport, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut report = BranchLinkReport::default();

        let primary = Self::timeline_id(&mut tx, universe_id, TimelineKey::Primary).await?;
        let mbti = Self::timeline_id(&mut tx, universe_id, TimelineKey::Mbti).await?;
        let mama = Self::timeline_id(&mut tx, universe_id, TimelineKey::RaniaMamaOriginal).await?;
        let healthy =
            Self::timeline_id(&mut tx, universe_id, TimelineKey::RaniaMamaHealthy).await?;

        // ── Healthy Mama branches from the last original Mama scene ──
        if let (Some(mama), Some(healthy)) = (mama, healthy) {
            let last: Option<(DbId, String)> = sqlx::query_as(
                "SELECT id, title FROM scenes WHERE timeline_id = $1
                 ORDER BY \"order\" DESC, id DESC LIMIT 1",
            )
            .bind(mama)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some((scene_id, title)) = last {
                Self::flag(&mut tx, scene_id, MAMA_BRANCH_QUESTION).await?;
                report.flagged.push(title);
                Self::link(&mut tx, healthy, scene_id).await?;
                report.linked.push(TimelineKey::RaniaMamaHealthy.name().to_string());
            }
        }

        if let Some(primary) = primary {
            // ── Keyword decision points ──
            for (keyword, question) in PRIMARY_BRANCH_KEYWORDS {
                let hit: Option<(DbId, String)> = sqlx::query_as(
                    "SELECT id, title FROM scenes
                     WHERE timeline_id = $1 AND is_branch_point = false
                       AND (content ILIKE $2 OR title ILIKE $2)
                     ORDER BY \"order\" ASC, id ASC LIMIT 1",
                )
                .bind(primary)
                .bind(storyverse_core::search::like_pattern(keyword))
                .fetch_optional(&mut *tx)
                .await?;
                if let Some((scene_id, title)) = hit {
                    Self::flag(&mut tx, scene_id, question).await?;
                    report.flagged.push(title);
                }
            }

            // ── MBTI perspectives branch from a joint INFJ/INFP scene ──
            if let Some(mbti) = mbti {
                let hit: Option<(DbId, String, bool)> = sqlx::query_as(
                    "SELECT id, title, is_branch_point FROM scenes
                     WHERE timeline_id = $1 AND content ILIKE '%INFJ%' AND content ILIKE '%INFP%'
                     ORDER BY \"order\" ASC, id ASC
                     OFFSET $2 LIMIT 1",
                )
                .bind(primary)
                .bind(MBTI_BRANCH_OFFSET)
                .fetch_optional(&mut *tx)
                .await?;
                if let Some((scene_id, title, already_flagged)) = hit {
                    if !already_flagged {
                        Self::flag(&mut tx, scene_id, MBTI_BRANCH_QUESTION).await?;
                        report.flagged.push(title);
                    }
                    Self::link(&mut tx, mbti, scene_id).await?;
                    report.linked.push(TimelineKey::Mbti.name().to_string());
                }
            }
        }

        report.branch_points = sqlx::query_scalar(
            "SELECT COUNT(*) FROM scenes s
             JOIN timelines t ON t.id = s.timeline_id
             WHERE t.universe_id = $1 AND s.is_branch_point = true",
        )
        .bind(universe_id)
        .fetch_one(&mut *tx)
        .await?;
        report.branched_timelines = sqlx::query_scalar(
            "SELECT COUNT(*) FROM timelines WHERE universe_id = $1 AND branch_from_id IS NOT NULL",
        )
        .bind(universe_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            universe_id,
            flagged = report.flagged.len(),
            linked = report.linked.len(),
            "Branch points linked"
        );
        Ok(report)
    }

    async fn timeline_id(
        tx: &mut Tx<'_>,
        universe_id: DbId,
        key: TimelineKey,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM timelines WHERE universe_id = $1 AND name = $2 ORDER BY id LIMIT 1",
        )
        .bind(universe_id)
        .bind(key.name())
        .fetch_optional(&mut **tx)
        .await
    }

    async fn flag(tx: &mut Tx<'_>, scene_id: DbId, question: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE scenes SET is_branch_point = true, branch_question = $2 WHERE id = $1")
            .bind(scene_id)
            .bind(question)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn link(tx: &mut Tx<'_>, timeline_id: DbId, scene_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE timelines SET branch_from_id = $2 WHERE id = $1")
            .bind(timeline_id)
            .bind(scene_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
