//! Manuscript profile: one long document split across five fixed timelines.
//!
//! [`plan`] is the whole parsing side. It decides scene boundaries, titles,
//! timeline routing, detected characters and tags, and which scenes are too
//! short to keep. Persisting a plan is the repository's job.

use std::ops::RangeInclusive;

use serde::Serialize;

use super::rules::{
    ANALYST_RE, EMOJI_MARKERS, MANUSCRIPT_BOUNDARY_RES, MAX_TITLE_LENGTH, SPEAKER_RE,
};
use super::segment::{segment, BoundaryRules, LineClass, Segment};
use crate::text::{limit, word_count};
use crate::validation::TagCategory;

/// Scenes whose trimmed content is shorter than this are skipped.
pub const MIN_SCENE_LENGTH: usize = 50;

/// 1-based line numbers that always belong to the MBTI perspectives.
pub const MBTI_LINES: RangeInclusive<usize> = 27800..=28000;

/// A progress entry is logged every this many imported scenes.
pub const PROGRESS_INTERVAL: usize = 100;

// ---------------------------------------------------------------------------
// Setup data
// ---------------------------------------------------------------------------

pub const UNIVERSE_NAME: &str = "INFJ × INFP Journey";
pub const UNIVERSE_DESCRIPTION: &str = "A deep exploration of INFJ and INFP relationship dynamics, including multiple perspectives and character studies.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKey {
    Primary,
    Mbti,
    RaniaPapa,
    RaniaMamaOriginal,
    RaniaMamaHealthy,
}

impl TimelineKey {
    pub const ALL: [TimelineKey; 5] = [
        Self::Primary,
        Self::Mbti,
        Self::RaniaPapa,
        Self::RaniaMamaOriginal,
        Self::RaniaMamaHealthy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Primary => "Primary Story",
            Self::Mbti => "MBTI Perspectives",
            Self::RaniaPapa => "Rania & Papa",
            Self::RaniaMamaOriginal => "Rania & Mama - Original",
            Self::RaniaMamaHealthy => "Rania & Mama - Healthy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Primary => "Main INFJ × INFP relationship narrative",
            Self::Mbti => "16 personality types analyzing the relationship",
            Self::RaniaPapa => "Father-daughter relationship scenes",
            Self::RaniaMamaOriginal => "Original mother-daughter dynamics",
            Self::RaniaMamaHealthy => "Alternative healthy relationship scenarios",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Primary => "#1CB0F6",
            Self::Mbti => "#8B5CF6",
            Self::RaniaPapa => "#10B981",
            Self::RaniaMamaOriginal => "#F59E0B",
            Self::RaniaMamaHealthy => "#58CC02",
        }
    }

    pub fn is_canon(&self) -> bool {
        matches!(self, Self::Primary)
    }
}

/// A character created during setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSeed {
    pub name: String,
    pub nickname: Option<&'static str>,
    pub kind: Option<&'static str>,
    pub description: String,
    pub traits: Vec<String>,
    pub color: &'static str,
}

const PRINCIPALS: &[(&str, Option<&str>, Option<&str>, &str, &[&str], &str)] = &[
    (
        "INFJ",
        Some("The Advocate"),
        Some("INFJ"),
        "Female protagonist - thoughtful, planning-oriented, caring",
        &["planning", "perceptive", "caring", "structured"],
        "#1CB0F6",
    ),
    (
        "INFP",
        Some("The Mediator"),
        Some("INFP"),
        "Male protagonist - spontaneous, idealistic, go-with-the-flow",
        &["spontaneous", "idealistic", "flexible", "deep"],
        "#8B5CF6",
    ),
    (
        "Rania",
        None,
        Some("INFJ"),
        "Young INFJ daughter navigating family dynamics",
        &["sensitive", "quiet", "thoughtful"],
        "#EC4899",
    ),
    (
        "Papa",
        None,
        None,
        "Understanding and supportive father figure",
        &["understanding", "patient", "supportive"],
        "#10B981",
    ),
    (
        "Mama",
        None,
        None,
        "Mother with different communication style",
        &["direct", "practical", "caring"],
        "#F59E0B",
    ),
];

/// Personality type of analyst `#1` through `#16`.
pub const ANALYST_TYPES: [&str; 16] = [
    "INFJ", "ENFJ", "ENFP", "ISFP", "INTP", "INTJ", "INFP", "ISFJ", "ENTP", "ESFP", "ESFJ", "ISTP",
    "ENTJ", "ESTP", "ISTJ", "ESTJ",
];

const ANALYST_COLORS: [&str; 16] = [
    "#1CB0F6", "#8B5CF6", "#EC4899", "#F59E0B", "#10B981", "#58CC02", "#EF4444", "#3B82F6",
    "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899", "#F43F5E", "#F97316", "#EAB308",
];

/// Display name of analyst `number` (1-based), if it exists.
pub fn analyst_name(number: usize) -> Option<String> {
    let kind = ANALYST_TYPES.get(number.checked_sub(1)?)?;
    Some(format!("#{number} — {kind}"))
}

/// The five principals followed by the sixteen analysts.
pub fn character_seeds() -> Vec<CharacterSeed> {
    let principals = PRINCIPALS
        .iter()
        .map(|(name, nickname, kind, description, traits, color)| CharacterSeed {
            name: (*name).to_string(),
            nickname: *nickname,
            kind: *kind,
            description: (*description).to_string(),
            traits: traits.iter().map(|t| (*t).to_string()).collect(),
            color: *color,
        });
    let analysts = ANALYST_TYPES
        .iter()
        .zip(ANALYST_COLORS)
        .enumerate()
        .map(|(index, (kind, color))| CharacterSeed {
            name: format!("#{} — {kind}", index + 1),
            nickname: None,
            kind: Some(*kind),
            description: format!("{kind} perspective analyst"),
            traits: Vec::new(),
            color,
        });
    principals.chain(analysts).collect()
}

pub const TAG_TRAIN: &str = "Train Journey";
pub const TAG_CHAT: &str = "Chat Conversation";
pub const TAG_MONOLOGUE: &str = "Inner Monologue";
pub const TAG_MBTI: &str = "MBTI Analysis";
pub const TAG_FAMILY: &str = "Family Dynamics";
pub const TAG_HEALTHY: &str = "Healthy Alternative";

pub const TAG_SEEDS: &[(&str, TagCategory, &str)] = &[
    (TAG_TRAIN, TagCategory::Event, "#1CB0F6"),
    (TAG_CHAT, TagCategory::Event, "#8B5CF6"),
    (TAG_MONOLOGUE, TagCategory::Theme, "#EC4899"),
    (TAG_MBTI, TagCategory::Theme, "#F59E0B"),
    (TAG_FAMILY, TagCategory::Theme, "#10B981"),
    (TAG_HEALTHY, TagCategory::Other, "#58CC02"),
    ("Planning", TagCategory::Emotion, "#1CB0F6"),
    ("Spontaneous", TagCategory::Emotion, "#8B5CF6"),
    ("Romantic", TagCategory::Emotion, "#EC4899"),
    ("Conflict", TagCategory::Emotion, "#EF4444"),
    ("Resolution", TagCategory::Emotion, "#58CC02"),
];

// ---------------------------------------------------------------------------
// Branch-point linking
// ---------------------------------------------------------------------------

pub const MAMA_BRANCH_QUESTION: &str = "What if Mama learns to adjust to Rania's personality?";

/// Keyword searched in primary scenes, and the question of the first hit.
pub const PRIMARY_BRANCH_KEYWORDS: &[(&str, &str)] = &[
    (
        "resign",
        "What if he doesn't resign? What if the relationship continues long-distance?",
    ),
    (
        "2027",
        "What if the timeline changes? What if they don't meet the 2027 deadline?",
    ),
    (
        "Goodbye",
        "What if this isn't goodbye? What if they decide to fight for the relationship?",
    ),
];

pub const MBTI_BRANCH_QUESTION: &str =
    "How would different personality types analyze this relationship?";

/// Zero-based position among primary scenes mentioning both INFJ and INFP.
pub const MBTI_BRANCH_OFFSET: i64 = 10;

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Boundary rules of the manuscript profile.
pub struct ManuscriptRules;

impl BoundaryRules for ManuscriptRules {
    fn classify(&self, line: &str) -> LineClass {
        if line.is_empty() {
            return LineClass::Body;
        }
        let is_boundary = EMOJI_MARKERS.iter().any(|m| line.starts_with(m))
            || MANUSCRIPT_BOUNDARY_RES.iter().any(|re| re.is_match(line));
        if is_boundary {
            LineClass::Boundary(title_of(line))
        } else {
            LineClass::Body
        }
    }

    fn keeps_boundary_line(&self) -> bool {
        true
    }

    fn keeps_raw_lines(&self) -> bool {
        true
    }
}

/// Strip every emoji marker; an empty result means "use the fallback".
fn title_of(line: &str) -> String {
    let mut title = line.to_string();
    for marker in EMOJI_MARKERS {
        title = title.replace(marker, "");
    }
    let title = title.trim();
    if title.is_empty() {
        String::new()
    } else {
        limit(title, MAX_TITLE_LENGTH)
    }
}

/// A scene ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedScene {
    pub start_line: usize,
    pub title: String,
    pub content: String,
    pub timeline: TimelineKey,
    pub order: i32,
    /// Character names, deduplicated in first-seen order.
    pub characters: Vec<String>,
    /// Tag names, deduplicated in first-seen order.
    pub tags: Vec<&'static str>,
    pub word_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManuscriptPlan {
    pub scenes: Vec<PlannedScene>,
    /// Start lines of scenes skipped for being too short.
    pub skipped: Vec<usize>,
    pub total_lines: usize,
}

/// Split a manuscript into routed, annotated scenes.
pub fn plan(input: &str) -> ManuscriptPlan {
    let mut result = ManuscriptPlan {
        total_lines: input.lines().count(),
        ..ManuscriptPlan::default()
    };
    let mut counters = [0i32; TimelineKey::ALL.len()];

    for seg in segment(input, &ManuscriptRules) {
        let detected = detect(&seg);
        let counter = &mut counters[detected.timeline as usize];
        *counter += 1;
        let order = *counter;

        let content = seg.texts().collect::<Vec<_>>().join("\n").trim().to_string();
        if content.chars().count() < MIN_SCENE_LENGTH {
            result.skipped.push(seg.start_line);
            continue;
        }

        let title = if seg.title.is_empty() {
            format!("Scene {}", result.scenes.len() + 1)
        } else {
            seg.title.clone()
        };

        result.scenes.push(PlannedScene {
            start_line: seg.start_line,
            title,
            word_count: word_count(&content),
            content,
            timeline: detected.timeline,
            order,
            characters: detected.characters,
            tags: detected.tags,
        });
    }

    result
}

struct Detected {
    timeline: TimelineKey,
    characters: Vec<String>,
    tags: Vec<&'static str>,
}

/// Route and annotate a scene from the lines after its boundary line.
fn detect(seg: &Segment) -> Detected {
    let mut detected = Detected {
        timeline: TimelineKey::Primary,
        characters: Vec::new(),
        tags: Vec::new(),
    };

    for line in seg.lines.iter().skip(1) {
        let lower = line.text.to_lowercase();
        detected.timeline = route(line.number, &lower, detected.timeline);
        for name in line_characters(&line.text, &lower) {
            if !detected.characters.contains(&name) {
                detected.characters.push(name);
            }
        }
        for tag in line_tags(&line.text, &lower) {
            if !detected.tags.contains(&tag) {
                detected.tags.push(tag);
            }
        }
    }

    detected
}

fn route(number: usize, lower: &str, current: TimelineKey) -> TimelineKey {
    if MBTI_LINES.contains(&number) {
        return TimelineKey::Mbti;
    }
    if lower.contains("rania") && lower.contains("papa") {
        return TimelineKey::RaniaPapa;
    }
    if lower.contains("rania") && lower.contains("mama") {
        if lower.contains("healthy version") || lower.contains("healthy)") {
            return TimelineKey::RaniaMamaHealthy;
        }
        return TimelineKey::RaniaMamaOriginal;
    }
    current
}

fn line_characters(raw: &str, lower: &str) -> Vec<String> {
    let mut names = Vec::new();
    for principal in ["INFJ", "INFP"] {
        let prefix = format!("{}:", principal.to_lowercase());
        if lower.starts_with(&prefix) || raw.contains(&format!("Inner monologue {principal}:")) {
            names.push(principal.to_string());
        }
    }
    if lower.contains("rania") {
        names.push("Rania".to_string());
    }
    if lower.contains("papa:") || lower.contains("ayah") {
        names.push("Papa".to_string());
    }
    if lower.contains("mama:") || lower.contains("ibu") {
        names.push("Mama".to_string());
    }
    if let Some(caps) = ANALYST_RE.captures(raw) {
        if let Some(name) = caps[1].parse::<usize>().ok().and_then(analyst_name) {
            names.push(name);
        }
    }
    names
}

fn line_tags(raw: &str, lower: &str) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if raw.contains("🚂") || lower.contains("kereta") || lower.contains("stasiun") {
        tags.push(TAG_TRAIN);
    }
    if SPEAKER_RE.is_match(raw) {
        tags.push(TAG_CHAT);
    }
    if raw.contains("Inner monologue") {
        tags.push(TAG_MONOLOGUE);
    }
    if ANALYST_RE.is_match(raw) {
        tags.push(TAG_MBTI);
    }
    if lower.contains("rania") || lower.contains("papa") || lower.contains("mama") {
        tags.push(TAG_FAMILY);
    }
    if lower.contains("healthy version") {
        tags.push(TAG_HEALTHY);
    }
    tags
}
