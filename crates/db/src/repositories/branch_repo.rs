//! Branching a new timeline off a scene.

use sqlx::PgPool;
use storyverse_core::branching::{plan_branch_copy, DEFAULT_BRANCH_COLOR};
use storyverse_core::ordering::SceneSlot;
use storyverse_core::types::DbId;

use crate::models::scene::{CreateBranch, Scene};
use crate::models::timeline::Timeline;
use crate::repositories::scene_repo::SceneFields;
use crate::repositories::{SceneRepo, TimelineRepo};

/// Outcome of a branch operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BranchOutcome {
    pub timeline: Timeline,
    pub copied_scenes: usize,
}

pub struct BranchRepo;

impl BranchRepo {
    /// Create a timeline branching from `source`, flag the source as a
    /// branch point and optionally copy every later scene of its timeline.
    ///
    /// Copies keep their content, metadata and character and tag links. They
    /// restart numbering at 1 and do not inherit the branch flag.
    pub async fn create_branch(
        pool: &PgPool,
        universe_id: DbId,
        source: &Scene,
        input: &CreateBranch,
    ) -> Result<BranchOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let timeline = TimelineRepo::insert_inner(
            &mut tx,
            universe_id,
            &input.name,
            input.description.as_deref(),
            input.color.as_deref().unwrap_or(DEFAULT_BRANCH_COLOR),
            false,
            Some(source.id),
        )
        .await?;

        sqlx::query("UPDATE scenes SET is_branch_point = true WHERE id = $1")
            .bind(source.id)
            .execute(&mut *tx)
            .await?;

        let mut copied_scenes = 0;
        if input.copy_subsequent_scenes {
            let query = "SELECT id, timeline_id, title, content, summary, \"order\", date, time, \
                         location, mood, pov, is_branch_point, branch_question, word_count, \
                         created_at, updated_at
                         FROM scenes WHERE timeline_id = $1 AND \"order\" > $2";
            let later: Vec<Scene> = sqlx::query_as(query)
                .bind(source.timeline_id)
                .bind(source.order)
                .fetch_all(&mut *tx)
                .await?;

            let slots: Vec<SceneSlot> = later
                .iter()
                .map(|s| SceneSlot {
                    id: s.id,
                    order: s.order,
                })
                .collect();
            for copy in plan_branch_copy(source.order, &slots) {
                let Some(original) = later.iter().find(|s| s.id == copy.source_scene_id) else {
                    continue;
                };
                let fields = SceneFields {
                    is_branch_point: false,
                    branch_question: None,
                    ..SceneFields::of(original)
                };
                let scene =
                    SceneRepo::insert_inner(&mut tx, timeline.id, copy.new_order, &fields).await?;
                SceneRepo::copy_associations_inner(&mut tx, original.id, scene.id).await?;
                copied_scenes += 1;
            }
        }

        tx.commit().await?;
        tracing::info!(
            timeline_id = timeline.id,
            source_scene_id = source.id,
            copied_scenes,
            "Branch timeline created"
        );
        Ok(BranchOutcome {
            timeline,
            copied_scenes,
        })
    }
}
