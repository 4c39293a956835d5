//! Response envelopes shared by every backend endpoint.

use serde::{Deserialize, Serialize};

/// `{ response_key, response_message, data }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub response_key: String,
    #[serde(default)]
    pub response_message: String,
    pub data: T,
}

/// A single page of results with paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    #[serde(default, rename = "response_key")]
    pub response_key: String,
    #[serde(default, rename = "response_message")]
    pub response_message: String,
    pub data: T,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub total_page: u32,
}

const fn first_page() -> u32 {
    1
}

impl<T> Paginated<T> {
    /// Whether there is a page after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_page
    }

    /// Whether there is a page before this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// `ceil(total / page_size)`, with an empty result still counting as one page.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_reads_mixed_case_fields() {
        let json = r#"{
            "response_key": "SUCCESS",
            "response_message": "ok",
            "data": [1, 2, 3],
            "page": 2,
            "pageSize": 3,
            "total": 9,
            "totalPage": 3
        }"#;
        let page: Paginated<Vec<u8>> = serde_json::from_str(json).unwrap();

        assert_eq!(page.response_message, "ok");
        assert_eq!(page.page_size, 3);
        assert_eq!(page.total_page, 3);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_paginated_defaults_when_meta_missing() {
        let page: Paginated<Vec<u8>> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_page, 1);
        assert!(!page.has_next());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(5, 0), 1);
    }
}
