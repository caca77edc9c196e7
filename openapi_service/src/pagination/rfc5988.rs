use serde_json::Value;

use super::{HeaderPaginationConfig, PaginationProvider};
use crate::definition::ResponseDefinition;
use crate::message::Response;
use crate::types::Pagination;

/// Header pagination using the `X-Pagination-*` header names.
///
/// Kept for APIs that still send this layout; [`HeaderPagination`](super::HeaderPagination)
/// with a custom [`HeaderPaginationConfig`] covers the same ground.
#[derive(Debug, Clone)]
pub struct JsonRfc5988Pagination {
    headers: HeaderPaginationConfig,
}

impl Default for JsonRfc5988Pagination {
    fn default() -> Self {
        Self::new(HeaderPaginationConfig {
            page: "X-Pagination-Page".to_string(),
            per_page: "X-Pagination-Per-Page".to_string(),
            total_items: "X-Pagination-Total-Items".to_string(),
            total_pages: "X-Pagination-Total-Pages".to_string(),
        })
    }
}

impl JsonRfc5988Pagination {
    pub fn new(headers: HeaderPaginationConfig) -> Self {
        Self { headers }
    }
}

impl PaginationProvider for JsonRfc5988Pagination {
    fn support_pagination(
        &self,
        _data: &Value,
        response: &Response,
        _definition: &ResponseDefinition,
    ) -> bool {
        self.headers
            .names()
            .iter()
            .all(|name| response.headers().contains_key(*name))
    }

    fn get_pagination(
        &self,
        data: Value,
        response: &Response,
        _definition: &ResponseDefinition,
    ) -> (Pagination, Value) {
        (self.headers.read(response), data)
    }
}
