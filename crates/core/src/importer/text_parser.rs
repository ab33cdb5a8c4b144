//! Text profile: pasted chat logs and prose into formatted scenes.

use std::collections::BTreeMap;

use serde::Serialize;

use super::rules::{
    BRANCH_PHRASES, DATE_RE, DIALOGUE_RE, HEADER_RE, LOCATION_RES, LOCATION_TAG_KEYWORDS,
    MAX_TITLE_LENGTH, MONOLOGUE_RE, MONOLOGUE_SPEAKER_RE, MOOD_KEYWORDS, ROUTE_RE, SKIP_RES,
    SPEAKER_RE, THEME_TAGS, TIMESTAMP_RE, TITLE_RES,
};
use super::segment::{segment, BoundaryRules, LineClass, Segment};
use crate::text::{limit, strip_tags, summarize, ucfirst};
use crate::validation::TagCategory;

/// A scene inferred from raw text, ready to preview or persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedScene {
    pub title: String,
    /// Formatted HTML content.
    pub content: String,
    pub summary: String,
    pub location: Option<String>,
    pub date: Option<String>,
    pub mood: Option<String>,
    pub is_branch_point: bool,
    /// Uppercased speaker names in first-seen order.
    pub characters: Vec<String>,
    pub tags: Vec<String>,
    /// 1-based position among the parsed scenes.
    pub order: i32,
}

/// Aggregate counts over one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub total_lines: usize,
    pub total_scenes: usize,
    pub characters: BTreeMap<String, usize>,
    pub moods: BTreeMap<String, usize>,
    pub locations: BTreeMap<String, usize>,
    pub tags: BTreeMap<String, usize>,
    pub branch_points: usize,
}

/// Boundary rules of the text profile.
pub struct TextRules;

impl BoundaryRules for TextRules {
    fn classify(&self, line: &str) -> LineClass {
        if SKIP_RES.iter().any(|re| re.is_match(line)) {
            return LineClass::Skip;
        }
        if DATE_RE.is_match(line) {
            return LineClass::Marker;
        }
        match extract_title(line) {
            Some(title) => LineClass::Boundary(title),
            None => LineClass::Body,
        }
    }
}

/// Parse raw text into scenes.
pub fn parse(input: &str) -> Vec<ParsedScene> {
    segment(input, &TextRules)
        .iter()
        .enumerate()
        .map(|(index, seg)| build_scene(seg, index as i32 + 1))
        .collect()
}

/// Parse and compute stats in one pass.
pub fn parse_with_stats(input: &str) -> (Vec<ParsedScene>, ParseStats) {
    let scenes = parse(input);
    let stats = compute_stats(input, &scenes);
    (scenes, stats)
}

fn build_scene(seg: &Segment, order: i32) -> ParsedScene {
    let lines: Vec<&str> = seg.texts().collect();
    let content = format_content(&lines);
    let mood_source = format!("{} {}", seg.title, lines.join(" "));
    let combined = format!("{} {}", seg.title, strip_tags(&content)).to_lowercase();

    ParsedScene {
        title: seg.title.clone(),
        summary: summarize(&content),
        location: extract_location(&seg.title),
        date: None,
        mood: detect_mood(&mood_source),
        is_branch_point: BRANCH_PHRASES.iter().any(|p| combined.contains(p)),
        characters: extract_characters(&lines),
        tags: generate_tags(&combined),
        content,
        order,
    }
}

// ---------------------------------------------------------------------------
// Line-level extraction
// ---------------------------------------------------------------------------

fn extract_title(line: &str) -> Option<String> {
    TITLE_RES.iter().find_map(|re| {
        re.captures(line).map(|caps| {
            let title = caps
                .get(1)
                .map(|m| m.as_str().trim())
                .filter(|t| !t.is_empty())
                .unwrap_or(line);
            limit(title, MAX_TITLE_LENGTH)
        })
    })
}

/// Render body lines as HTML paragraphs. Leading and trailing blank lines
/// are dropped; inner blank lines are kept as empty separators.
fn format_content(lines: &[&str]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.is_empty() {
            if !parts.is_empty() {
                parts.push(String::new());
            }
            continue;
        }
        parts.push(format_line(line));
    }

    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts.join("\n")
}

fn format_line(line: &str) -> String {
    if let Some(caps) = DIALOGUE_RE.captures(line) {
        let speaker = caps[1].to_uppercase();
        let text = caps[2].trim_matches('"');
        return format!("<p class=\"dialogue\"><strong>{speaker}:</strong> \"{text}\"</p>");
    }
    if let Some(caps) = MONOLOGUE_RE.captures(line) {
        let thought = caps[2].trim();
        return match caps.get(1) {
            Some(speaker) => format!(
                "<p class=\"inner-monologue\"><em>({}'s thoughts: {thought})</em></p>",
                speaker.as_str().to_uppercase()
            ),
            None => format!("<p class=\"inner-monologue\"><em>({thought})</em></p>"),
        };
    }
    if let Some(caps) = TIMESTAMP_RE.captures(line) {
        let description = caps[3].trim();
        return format!(
            "<p class=\"timestamp\"><strong>{}:{}</strong> — {description}</p>",
            &caps[1], &caps[2]
        );
    }
    if HEADER_RE.is_match(line) {
        return format!("<h4 class=\"scene-header\">{line}</h4>");
    }
    format!("<p>{line}</p>")
}

fn extract_characters(lines: &[&str]) -> Vec<String> {
    let mut characters: Vec<String> = Vec::new();
    let mut add = |name: &str| {
        let name = name.to_uppercase();
        if !characters.contains(&name) {
            characters.push(name);
        }
    };
    for line in lines {
        if let Some(caps) = SPEAKER_RE.captures(line) {
            add(&caps[1]);
        }
        if let Some(caps) = MONOLOGUE_SPEAKER_RE.captures(line) {
            add(&caps[1]);
        }
    }
    characters
}

// ---------------------------------------------------------------------------
// Scene-level derivation
// ---------------------------------------------------------------------------

fn extract_location(title: &str) -> Option<String> {
    if let Some((_, location)) = LOCATION_RES.iter().find(|(re, _)| re.is_match(title)) {
        return Some((*location).to_string());
    }
    ROUTE_RE
        .captures(title)
        .map(|caps| format!("{} → {}", caps[1].trim(), caps[2].trim()))
}

/// Highest keyword-occurrence count wins; ties go to the earlier mood.
fn detect_mood(text: &str) -> Option<String> {
    let text = text.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for (mood, keywords) in MOOD_KEYWORDS {
        let score: usize = keywords.iter().map(|k| text.matches(k).count()).sum();
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((mood, score));
        }
    }
    best.map(|(mood, _)| mood.to_string())
}

fn generate_tags(combined: &str) -> Vec<String> {
    let mut tags: Vec<String> = LOCATION_TAG_KEYWORDS
        .iter()
        .filter(|k| combined.contains(*k))
        .map(|k| ucfirst(k))
        .collect();
    for (tag, keywords) in THEME_TAGS {
        if keywords.iter().any(|k| combined.contains(k)) && !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags
}

fn compute_stats(input: &str, scenes: &[ParsedScene]) -> ParseStats {
    let mut stats = ParseStats {
        total_lines: input.split('\n').count(),
        total_scenes: scenes.len(),
        ..ParseStats::default()
    };
    for scene in scenes {
        for c in &scene.characters {
            *stats.characters.entry(c.clone()).or_default() += 1;
        }
        if let Some(mood) = &scene.mood {
            *stats.moods.entry(mood.clone()).or_default() += 1;
        }
        if let Some(location) = &scene.location {
            *stats.locations.entry(location.clone()).or_default() += 1;
        }
        for t in &scene.tags {
            *stats.tags.entry(t.clone()).or_default() += 1;
        }
        if scene.is_branch_point {
            stats.branch_points += 1;
        }
    }
    stats
}

// ---------------------------------------------------------------------------
// Import commit
// ---------------------------------------------------------------------------

/// Colors given to characters and tags created by an import, in rotation.
pub const IMPORT_PALETTE: [&str; 6] =
    ["#1CB0F6", "#58CC02", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899"];

/// Palette color of the `created`-th new character or tag (0-based). The
/// two kinds keep separate counters.
pub fn palette_color(created: usize) -> &'static str {
    IMPORT_PALETTE[created % IMPORT_PALETTE.len()]
}

/// Category of a tag created by an import, keyed on its lowercased name.
pub fn imported_tag_category(name: &str) -> TagCategory {
    match name.to_lowercase().as_str() {
        "bandung" | "garut" | "jakarta" | "kereta" | "stasiun" | "cafe" | "travel" => {
            TagCategory::Location
        }
        "romantic" | "happy" | "sad" | "goodbye" | "love" => TagCategory::Emotion,
        "first meeting" | "morning" | "night" => TagCategory::Event,
        _ => TagCategory::Other,
    }
}
