//! Pattern and keyword tables used by the importers.
//!
//! Table order matters: title patterns, moods and locations are all
//! first-match-wins or tie-broken by position.

use std::sync::LazyLock;

use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

// ── Shared ───────────────────────────────────────────────────────────

/// `Feb 2`: a bare month abbreviation and day.
pub static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{1,2})$")
});

/// Maximum title length before truncation.
pub const MAX_TITLE_LENGTH: usize = 100;

// ── Text profile: line classes ───────────────────────────────────────

/// Known meta and prompt lines that are discarded.
pub static SKIP_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^Claude's response was interrupted",
        r"(?i)^Bagaimana tipikal",
        r"(?i)^Coba skenarionya",
        r"(?i)^Minute by minute",
        r"(?i)^Oke,? ini dia",
        r"(?i)^Oke oke, aku adjust",
        r"(?i)^Let me rewrite",
    ]
    .into_iter()
    .map(re)
    .collect()
});

/// Scene title patterns, first match wins. Group 1, when present and
/// non-empty, is the title; otherwise the whole line is.
pub static TITLE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^🚂\s*(.+)$",
        r"^🎬\s*(.+)$",
        r"^🌙\s*(.+)$",
        r"^☀\x{FE0F}?\s*(.+)$",
        r"^🌅\s*(.+)$",
        r"^🏠\s*(.+)$",
        r"^💭\s*(.+)$",
        r"(?i)^Scene\s+\d+:\s*(.*)$",
        r#"^\d+\.\s+"(.+)""#,
        r"(?i)^(?:ACT|PART|CHAPTER)\s+\S",
    ]
    .into_iter()
    .map(re)
    .collect()
});

// ── Text profile: content formatting ─────────────────────────────────

pub static DIALOGUE_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r#"(?i)^(INFJ|INFP):\s*"?(.+)"?$"#));

pub static MONOLOGUE_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^Inner monologue\s*(INFJ|INFP)?:\s*(.*)$"));

pub static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"^(\d{1,2})[.:](\d{2})\s*—\s*(.*)$"));

pub static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^(MALAM|PAGI|SIANG|SORE)\s+(SEBELUMNYA|HARI)?"));

pub static SPEAKER_RE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^(INFJ|INFP):"));

pub static MONOLOGUE_SPEAKER_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)Inner monologue\s+(INFJ|INFP)"));

// ── Text profile: metadata tables ────────────────────────────────────

pub const MOOD_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "romantic",
        &["romantis", "sweet", "manis", "cinta", "love", "sayang", "peluk", "genggam", "kiss"],
    ),
    (
        "happy",
        &["senang", "happy", "gembira", "tertawa", "senyum", "excited", "seru"],
    ),
    (
        "sad",
        &["sedih", "sad", "nangis", "tears", "crying", "pisah", "pergi", "goodbye", "bye"],
    ),
    (
        "tense",
        &["tegang", "nervous", "deg-degan", "cemas", "worried", "khawatir"],
    ),
    (
        "peaceful",
        &["tenang", "damai", "calm", "peaceful", "nyaman", "santai"],
    ),
    (
        "mysterious",
        &["misterius", "aneh", "strange", "weird", "bingung"],
    ),
];

/// Title keyword to canonical location, first match wins.
pub static LOCATION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)Bandung", "Bandung"),
        (r"(?i)Garut", "Garut"),
        (r"(?i)Jakarta", "Jakarta"),
        (r"(?i)Stasiun", "Train Station"),
        (r"(?i)Kereta", "Train"),
        (r"(?i)Cafe", "Cafe"),
        (r"(?i)Rumah", "Home"),
        (r"(?i)Kos(an)?", "Boarding House"),
    ]
    .into_iter()
    .map(|(pattern, location)| (re(pattern), location))
    .collect()
});

/// `A → B` or `A → B: subtitle`.
pub static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"(.+?)\s*→\s*(.+?)(?::|$)"));

pub const BRANCH_PHRASES: &[&str] = &[
    "what if",
    "bagaimana kalau",
    "gimana kalo",
    "alternatif",
    "pilihan",
    "keputusan",
    "decision",
    "choice",
];

/// Location keywords emitted as capitalized tags.
pub const LOCATION_TAG_KEYWORDS: &[&str] = &["bandung", "garut", "jakarta", "kereta", "stasiun", "cafe"];

pub const THEME_TAGS: &[(&str, &[&str])] = &[
    ("goodbye", &["pisah", "pergi", "goodbye", "selamat tinggal"]),
    ("first meeting", &["pertama", "first", "kenalan"]),
    ("travel", &["jalan", "trip", "perjalanan", "travel"]),
    ("morning", &["pagi", "morning"]),
    ("night", &["malam", "night"]),
    ("romantic", &["romantis", "love", "sayang"]),
];

// ── Manuscript profile ───────────────────────────────────────────────

pub const EMOJI_MARKERS: &[&str] = &["🚂", "📍", "💬", "🎬", "💭", "🏠", "☕", "🌙", "🌅"];

pub static MANUSCRIPT_BOUNDARY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{2}\.\d{2}\s*—",
        r"(?i)^Scene\s+\d+:",
        r#"^\d+\.\s+".+""#,
        r"^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d+$",
        r"(?i)^(ACT|PART|CHAPTER)\s+",
        r"(?i)^(MALAM|PAGI|SIANG|SORE)\s+(SEBELUMNYA|HARI INI|KEMARIN)",
    ]
    .into_iter()
    .map(re)
    .collect()
});

pub static ANALYST_RE: LazyLock<Regex> = LazyLock::new(|| re(r"#(\d+)\s*—\s*([A-Z]{4})"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tables_compile() {
        assert_eq!(SKIP_RES.len(), 7);
        assert_eq!(TITLE_RES.len(), 10);
        assert_eq!(LOCATION_RES.len(), 8);
        assert_eq!(MANUSCRIPT_BOUNDARY_RES.len(), 6);
        LazyLock::force(&DATE_RE);
        LazyLock::force(&DIALOGUE_RE);
        LazyLock::force(&MONOLOGUE_RE);
        LazyLock::force(&TIMESTAMP_RE);
        LazyLock::force(&HEADER_RE);
        LazyLock::force(&SPEAKER_RE);
        LazyLock::force(&MONOLOGUE_SPEAKER_RE);
        LazyLock::force(&ROUTE_RE);
        LazyLock::force(&ANALYST_RE);
    }

    #[test]
    fn date_marker_is_case_insensitive() {
        assert!(DATE_RE.is_match("Feb 2"));
        assert!(DATE_RE.is_match("feb 14"));
        assert!(!DATE_RE.is_match("Feb 2 2024"));
    }

    #[test]
    fn sun_marker_accepts_variation_selector() {
        assert!(TITLE_RES[3].is_match("☀️ Siang"));
        assert!(TITLE_RES[3].is_match("☀ Siang"));
    }
}
