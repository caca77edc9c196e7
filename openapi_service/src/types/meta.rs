use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Response metadata attached to items and collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Every response header, keyed by lower-case name, values in received order.
    pub headers: BTreeMap<String, Vec<String>>,
}

impl Meta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                map.entry(name.as_str().to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }
        Self { headers: map }
    }

    /// First value of `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PaginationLinks>,
}

impl Pagination {
    pub fn new(
        page: i64,
        per_page: i64,
        total_items: i64,
        total_pages: i64,
        links: Option<PaginationLinks>,
    ) -> Self {
        Self {
            page,
            per_page,
            total_items,
            total_pages,
            links,
        }
    }

    pub fn has_links(&self) -> bool {
        self.links.is_some()
    }
}

/// Navigation links of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl PaginationLinks {
    pub fn new(
        first: impl Into<String>,
        last: impl Into<String>,
        next: Option<String>,
        prev: Option<String>,
    ) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            next,
            prev,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }
}
