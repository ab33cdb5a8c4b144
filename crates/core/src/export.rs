//! Export documents for universes, timelines and scenes.
//!
//! The JSON shape is a portable backup: associations are carried by name,
//! never by id. The Markdown rendering is for reading.

use serde::{Deserialize, Serialize};

use crate::text::{decode_entities, strip_tags};
use crate::types::Timestamp;

/// Version stamped into every JSON export.
pub const EXPORT_VERSION: &str = "1.0";

/// Maximum length of a sanitized filename stem, in characters.
pub const MAX_FILENAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// JSON export envelope
// ---------------------------------------------------------------------------

/// Versioned wrapper around any export body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument<T> {
    pub export_version: String,
    pub exported_at: Timestamp,
    #[serde(flatten)]
    pub body: T,
}

impl<T> ExportDocument<T> {
    pub fn new(body: T, exported_at: Timestamp) -> Self {
        Self {
            export_version: EXPORT_VERSION.to_string(),
            exported_at,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseExport {
    pub universe: UniverseInfo,
    pub characters: Vec<CharacterExport>,
    pub tags: Vec<TagExport>,
    pub timelines: Vec<TimelineExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseInfo {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub allow_fork: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterExport {
    pub name: String,
    pub nickname: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub traits: Vec<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagExport {
    pub name: String,
    pub color: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineExport {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_canon: bool,
    /// Ascending by order.
    pub scenes: Vec<SceneExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneExport {
    pub title: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub order: i32,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub mood: Option<String>,
    pub pov: Option<String>,
    pub is_branch_point: bool,
    pub branch_question: Option<String>,
    /// Character names.
    pub characters: Vec<String>,
    /// Tag names.
    pub tags: Vec<String>,
}

/// Body of a single-timeline export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineDocument {
    pub timeline: TimelineExport,
}

/// Body of a single-scene export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub scene: SceneExport,
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn universe_markdown(export: &UniverseExport) -> String {
    let mut md = format!("# {}\n\n", export.universe.name);
    if let Some(description) = present(&export.universe.description) {
        md.push_str(&format!("{description}\n\n"));
    }
    md.push_str("---\n\n");

    if !export.characters.is_empty() {
        md.push_str("## Characters\n\n");
        for character in &export.characters {
            md.push_str(&format!("### {}", character.name));
            if let Some(kind) = present(&character.kind) {
                md.push_str(&format!(" ({kind})"));
            }
            md.push_str("\n\n");
            if let Some(description) = present(&character.description) {
                md.push_str(&format!("{description}\n\n"));
            }
        }
        md.push_str("---\n\n");
    }

    for timeline in &export.timelines {
        md.push_str(&timeline_markdown(timeline));
        md.push_str("\n---\n\n");
    }
    md
}

pub fn timeline_markdown(timeline: &TimelineExport) -> String {
    let mut md = format!("## {}", timeline.name);
    if timeline.is_canon {
        md.push_str(" (Canon)");
    }
    md.push_str("\n\n");
    if let Some(description) = present(&timeline.description) {
        md.push_str(&format!("*{description}*\n\n"));
    }
    for scene in &timeline.scenes {
        md.push_str(&scene_markdown(scene, 3));
    }
    md
}

/// Render a scene under a heading of the given level (1 when standalone).
pub fn scene_markdown(scene: &SceneExport, heading_level: usize) -> String {
    let mut md = format!("{} {}\n\n", "#".repeat(heading_level), scene.title);

    let mut metadata = Vec::new();
    if let Some(date) = present(&scene.date) {
        metadata.push(format!("**Date:** {date}"));
    }
    if let Some(location) = present(&scene.location) {
        metadata.push(format!("**Location:** {location}"));
    }
    if let Some(mood) = present(&scene.mood) {
        metadata.push(format!("**Mood:** {mood}"));
    }
    if let Some(pov) = present(&scene.pov) {
        metadata.push(format!("**POV:** {pov}"));
    }
    if scene.is_branch_point {
        metadata.push("**Branch Point**".to_string());
        if let Some(question) = present(&scene.branch_question) {
            metadata.push(format!("*{question}*"));
        }
    }
    if !metadata.is_empty() {
        md.push_str(&metadata.join(" | "));
        md.push_str("\n\n");
    }

    if !scene.characters.is_empty() {
        md.push_str(&format!("**Characters:** {}\n\n", scene.characters.join(", ")));
    }
    if !scene.tags.is_empty() {
        let tags: Vec<String> = scene.tags.iter().map(|t| format!("#{t}")).collect();
        md.push_str(&format!("**Tags:** {}\n\n", tags.join(" ")));
    }
    if let Some(summary) = present(&scene.summary) {
        md.push_str(&format!("> {summary}\n\n"));
    }
    if let Some(content) = present(&scene.content) {
        md.push_str(&decode_entities(&strip_tags(content)));
        md.push_str("\n\n");
    }
    md
}

/// Make a display name safe to use as a download filename stem.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ') {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').chars().take(MAX_FILENAME_LENGTH).collect()
}
