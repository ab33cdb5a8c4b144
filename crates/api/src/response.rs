//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })` to get compile-time
//! type safety and consistent serialization.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "meta": {...} }` envelope for paged listings.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    /// 1-based page number.
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl PageMeta {
    pub fn new(page: Option<i64>, per_page: i64, total: i64) -> Self {
        let last_page = ((total + per_page - 1) / per_page).max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            per_page,
            total,
            last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up_and_is_at_least_one() {
        assert_eq!(PageMeta::new(None, 12, 0).last_page, 1);
        assert_eq!(PageMeta::new(Some(2), 12, 13).last_page, 2);
        assert_eq!(PageMeta::new(Some(0), 12, 24).page, 1);
    }
}
