use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{leading_int, parse_link_header, PaginationProvider};
use crate::definition::ResponseDefinition;
use crate::message::Response;
use crate::types::Pagination;

/// Header names read by [`HeaderPagination`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderPaginationConfig {
    pub page: String,
    pub per_page: String,
    pub total_items: String,
    pub total_pages: String,
}

impl Default for HeaderPaginationConfig {
    fn default() -> Self {
        Self {
            page: "X-Page".to_string(),
            per_page: "X-Per-Page".to_string(),
            total_items: "X-Total-Items".to_string(),
            total_pages: "X-Total-Pages".to_string(),
        }
    }
}

impl HeaderPaginationConfig {
    pub(super) fn names(&self) -> [&str; 4] {
        [
            self.page.as_str(),
            self.per_page.as_str(),
            self.total_items.as_str(),
            self.total_pages.as_str(),
        ]
    }

    /// Reads the four numbers from headers and the links from `Link`.
    pub(super) fn read(&self, response: &Response) -> Pagination {
        let number = |name: &str| leading_int(&response.header_line(name));
        Pagination::new(
            number(&self.page),
            number(&self.per_page),
            number(&self.total_items),
            number(&self.total_pages),
            parse_link_header(&response.header_values("link")),
        )
    }
}

/// Pagination carried in response headers, with navigation links in an
/// RFC 5988 `Link` header.
#[derive(Debug, Clone, Default)]
pub struct HeaderPagination {
    config: HeaderPaginationConfig,
}

impl HeaderPagination {
    pub fn new(config: HeaderPaginationConfig) -> Self {
        Self { config }
    }
}

impl PaginationProvider for HeaderPagination {
    fn support_pagination(
        &self,
        _data: &Value,
        response: &Response,
        _definition: &ResponseDefinition,
    ) -> bool {
        self.config
            .names()
            .iter()
            .all(|name| !response.header_line(name).is_empty())
    }

    fn get_pagination(
        &self,
        data: Value,
        response: &Response,
        _definition: &ResponseDefinition,
    ) -> (Pagination, Value) {
        (self.config.read(response), data)
    }
}
