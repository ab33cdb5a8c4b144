//! Shared query parameter types for API handlers.

use serde::Deserialize;
use storyverse_core::types::DbId;

/// Scalar parameters of `GET /universes/{id}/search`.
///
/// The id lists (`tag_ids[]`, `character_ids[]`) repeat their key, which
/// `Query` cannot collect, so they are read from the raw query with
/// [`id_list`].
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub mood: Option<String>,
    pub timeline_id: Option<DbId>,
    pub sort: Option<String>,
    pub sort_dir: Option<String>,
    pub limit: Option<i64>,
}

/// Parameters of `GET /explore`.
#[derive(Debug, Default, Deserialize)]
pub struct ExploreParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    /// 1-based.
    pub page: Option<i64>,
}

/// Collect every id passed as `name[]=1`, `name=1` or `name=1,2` in a raw
/// query string. Unparseable values are ignored.
pub fn id_list(raw: Option<&str>, name: &str) -> Vec<DbId> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let bracketed = format!("{name}[]");
    let encoded = format!("{name}%5B%5D");

    let mut ids = Vec::new();
    for pair in raw.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let matches = key == name || key == bracketed || key.eq_ignore_ascii_case(&encoded);
        if !matches {
            continue;
        }
        ids.extend(
            value
                .split([',', '+'])
                .filter_map(|v| v.trim().parse::<DbId>().ok()),
        );
    }
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Blank strings count as absent.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
