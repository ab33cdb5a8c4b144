//! Scene search and explore constants and helpers.
//!
//! Lives in `core` so the repository layer can build queries from validated
//! values instead of raw request strings.

use crate::text::{decode_entities, strip_tags};

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default and maximum number of scene search results.
pub const MAX_SEARCH_LIMIT: i64 = 50;

/// Public universes per explore page.
pub const EXPLORE_PAGE_SIZE: i64 = 12;

/// Characters of context on each side of a search hit.
pub const MATCH_CONTEXT_RADIUS: usize = 50;

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sortable scene columns. Anything else falls back to [`SortField::Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Order,
    Title,
    CreatedAt,
}

impl SortField {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("date") => Self::Date,
            Some("title") => Self::Title,
            Some("created_at") => Self::CreatedAt,
            _ => Self::Order,
        }
    }

    /// Qualified column name, safe to interpolate into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Date => "s.date",
            Self::Order => "s.\"order\"",
            Self::Title => "s.title",
            Self::CreatedAt => "s.created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Explore listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploreSort {
    Latest,
    Popular,
    Name,
}

impl ExploreSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("popular") => Self::Popular,
            Some("name") => Self::Name,
            _ => Self::Latest,
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            Self::Latest => "u.created_at DESC, u.id DESC",
            Self::Popular => "u.fork_count DESC, u.id DESC",
            Self::Name => "u.name ASC, u.id ASC",
        }
    }
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Offset of a 1-based page.
pub fn page_offset(page: Option<i64>, page_size: i64) -> i64 {
    page.unwrap_or(1)
        .max(1)
        .saturating_sub(1)
        .saturating_mul(page_size)
}

/// Build an `ILIKE` pattern matching `term` anywhere, with `%`, `_` and `\`
/// escaped so they match literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// A window of [`MATCH_CONTEXT_RADIUS`] characters either side of the first
/// case-insensitive hit of `query` in the plain text of `content`.
///
/// Returns `None` when the query does not occur.
pub fn match_context(content: &str, query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let text: Vec<char> = decode_entities(&strip_tags(content)).chars().collect();
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let haystack: Vec<char> = text
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();

    let hit = haystack
        .windows(needle.len())
        .position(|window| window == needle.as_slice())?;

    let start = hit.saturating_sub(MATCH_CONTEXT_RADIUS);
    let end = (hit + needle.len() + MATCH_CONTEXT_RADIUS).min(text.len());
    let mut snippet: String = text[start..end].iter().collect();
    if start > 0 {
        snippet.insert_str(0, "...");
    }
    if end < text.len() {
        snippet.push_str("...");
    }
    Some(snippet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_allow_list() {
        assert_eq!(SortField::parse(Some("title")), SortField::Title);
        assert_eq!(SortField::parse(Some("created_at")), SortField::CreatedAt);
        assert_eq!(SortField::parse(Some("id; DROP TABLE scenes")), SortField::Order);
        assert_eq!(SortField::parse(None), SortField::Order);
    }

    #[test]
    fn sort_direction_defaults_to_asc() {
        assert_eq!(SortDirection::parse(Some("DESC")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Asc);
    }

    #[test]
    fn explore_sort_defaults_to_latest() {
        assert_eq!(ExploreSort::parse(Some("popular")), ExploreSort::Popular);
        assert_eq!(ExploreSort::parse(Some("oldest")), ExploreSort::Latest);
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None, 50, 50), 50);
        assert_eq!(clamp_limit(Some(500), 50, 50), 50);
        assert_eq!(clamp_limit(Some(0), 50, 50), 1);
    }

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(page_offset(None, 12), 0);
        assert_eq!(page_offset(Some(3), 12), 24);
        assert_eq!(page_offset(Some(-2), 12), 0);
    }

    #[test]
    fn page_offset_saturates_on_huge_pages() {
        assert_eq!(page_offset(Some(i64::MAX), EXPLORE_PAGE_SIZE), i64::MAX);
        assert_eq!(page_offset(Some(i64::MIN), EXPLORE_PAGE_SIZE), 0);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn match_context_short_text_has_no_ellipsis() {
        assert_eq!(
            match_context("<p>Hello Bandung</p>", "bandung").as_deref(),
            Some("Hello Bandung")
        );
    }

    #[test]
    fn match_context_windows_long_text() {
        let content = format!("{}needle{}", "a".repeat(80), "b".repeat(80));
        let ctx = match_context(&content, "NEEDLE").unwrap();
        assert!(ctx.starts_with("..."));
        assert!(ctx.ends_with("..."));
        assert_eq!(ctx.chars().count(), 3 + 50 + 6 + 50 + 3);
    }

    #[test]
    fn match_context_miss() {
        assert_eq!(match_context("nothing here", "absent"), None);
        assert_eq!(match_context("anything", "  "), None);
    }
}
