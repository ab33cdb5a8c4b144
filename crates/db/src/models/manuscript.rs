//! Manuscript ingestion stats, log and outcome.

use serde::Serialize;
use storyverse_core::types::DbId;

/// Counters reported by a manuscript import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManuscriptStats {
    pub universes_created: usize,
    pub timelines_created: usize,
    pub characters_created: usize,
    pub tags_created: usize,
    pub scenes_imported: usize,
    pub scenes_skipped: usize,
    pub total_lines: usize,
    pub errors: usize,
}

/// Timestamped operation log kept alongside `tracing` output so the caller
/// gets the full story back.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ImportLog {
    entries: Vec<String>,
}

impl ImportLog {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "storyverse_db::manuscript", "{message}");
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
        self.entries.push(format!("[{now}] {message}"));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }
}

/// Result of one manuscript import, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct ManuscriptOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stats: ManuscriptStats,
    pub log: ImportLog,
    /// Set only when the import was committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe_id: Option<DbId>,
}

/// Summary of the branch-point linking pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BranchLinkReport {
    /// Scenes flagged during this run, by title.
    pub flagged: Vec<String>,
    /// Timelines whose `branch_from_id` was set during this run, by name.
    pub linked: Vec<String>,
    /// Branch points in the universe after the run.
    pub branch_points: i64,
    /// Timelines in the universe with a branch origin after the run.
    pub branched_timelines: i64,
}
