use axum::http::header::{CONTENT_RANGE, HeaderMap, HeaderValue};

use crate::query::{FromQueryParams, QueryParams};

pub const DEFAULT_PER_PAGE: u64 = 15;
pub const MAX_PER_PAGE: u64 = 100;
/// Largest offset a query may carry. Leaves room for `LIMIT` so their sum
/// still fits the signed 64-bit integers databases bind.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs() - MAX_PER_PAGE;

/// `page` / `per_page` query parameters. Invalid values fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.per_page);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page
    }
}

impl FromQueryParams for Pagination {
    fn from_query(params: &QueryParams) -> Self {
        let page = params
            .get("page")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        let per_page = params
            .get("per_page")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(DEFAULT_PER_PAGE, |per_page| per_page.clamp(1, MAX_PER_PAGE));

        Self { page, per_page }
    }
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build the `Content-Range` header for a page of results.
///
/// Produces `<resource> <first>-<last>/<total>` with inclusive, zero-based
/// indices, or `<resource> */<total>` when the page is empty.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    returned: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);

    let content_range = if returned == 0 {
        format!("{safe_name} */{total_count}")
    } else {
        let last = offset.saturating_add(returned - 1);
        format!("{safe_name} {offset}-{last}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&content_range) {
        headers.insert(CONTENT_RANGE, value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(headers: &HeaderMap) -> &str {
        headers.get(CONTENT_RANGE).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_content_range_normal() {
        let headers = calculate_content_range(0, 10, 100, "students");
        assert_eq!(header(&headers), "students 0-9/100");
    }

    #[test]
    fn test_content_range_partial_last_page() {
        let headers = calculate_content_range(30, 5, 35, "students");
        assert_eq!(header(&headers), "students 30-34/35");
    }

    #[test]
    fn test_content_range_empty_page() {
        let headers = calculate_content_range(0, 0, 0, "degrees");
        assert_eq!(header(&headers), "degrees */0");
    }

    #[test]
    fn test_content_range_strips_control_chars() {
        let headers = calculate_content_range(0, 1, 1, "degrees\r\nInjected: evil");
        let value = header(&headers);
        assert!(!value.contains('\r'));
        assert!(!value.contains('\n'));
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let defaults: Pagination = QueryParams::parse(None).extract();
        assert_eq!(defaults, Pagination::default());
        assert_eq!(defaults.offset(), 0);

        let big: Pagination = QueryParams::parse(Some("page=3&per_page=1000")).extract();
        assert_eq!(big.per_page, MAX_PER_PAGE);
        assert_eq!(big.offset(), 200);

        let junk: Pagination = QueryParams::parse(Some("page=0&per_page=abc")).extract();
        assert_eq!(junk, Pagination::default());
    }

    #[test]
    fn test_huge_page_offset_stays_bindable() {
        let huge: Pagination =
            QueryParams::parse(Some("page=100000000000000000&per_page=100")).extract();
        assert_eq!(huge.offset(), MAX_OFFSET);
        assert!(i64::try_from(huge.offset() + huge.limit()).is_ok());

        let last: Pagination = QueryParams::parse(Some(&format!("page={}", u64::MAX))).extract();
        assert_eq!(last.offset(), MAX_OFFSET);
    }
}
