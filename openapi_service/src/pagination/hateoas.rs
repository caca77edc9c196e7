use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{as_int, PaginationProvider};
use crate::definition::ResponseDefinition;
use crate::message::Response;
use crate::types::{Pagination, PaginationLinks};

/// Top-level body keys holding the pagination numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HateoasPaginationConfig {
    pub page: String,
    pub per_page: String,
    pub total_items: String,
    pub total_pages: String,
}

impl Default for HateoasPaginationConfig {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            per_page: "perPage".to_string(),
            total_items: "totalItems".to_string(),
            total_pages: "totalPages".to_string(),
        }
    }
}

/// Pagination numbers and `_links` inside the body, entries in the first
/// `_embedded` relation.
#[derive(Debug, Clone, Default)]
pub struct HateoasPagination {
    config: HateoasPaginationConfig,
}

impl HateoasPagination {
    pub fn new(config: HateoasPaginationConfig) -> Self {
        Self { config }
    }

    fn number(&self, data: &Value, key: &str) -> i64 {
        data.get(key).map_or(0, as_int)
    }
}

impl PaginationProvider for HateoasPagination {
    fn support_pagination(
        &self,
        data: &Value,
        _response: &Response,
        _definition: &ResponseDefinition,
    ) -> bool {
        let present = |key: &str| data.get(key).is_some_and(|v| !v.is_null());
        let c = &self.config;
        if ![&c.page, &c.per_page, &c.total_items, &c.total_pages]
            .iter()
            .all(|key| present(key))
        {
            return false;
        }
        if !present("_embedded") {
            return false;
        }
        match data.get("_links") {
            Some(links) => ["self", "first", "last"]
                .iter()
                .all(|rel| links.get(*rel).is_some_and(|v| !v.is_null())),
            None => false,
        }
    }

    fn get_pagination(
        &self,
        data: Value,
        _response: &Response,
        _definition: &ResponseDefinition,
    ) -> (Pagination, Value) {
        let links = data
            .get("_links")
            .and_then(Value::as_object)
            .filter(|links| !links.is_empty())
            .map(|links| {
                let href = |rel: &str| {
                    links
                        .get(rel)
                        .and_then(|link| link.get("href"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                PaginationLinks::new(
                    href("first").unwrap_or_default(),
                    href("last").unwrap_or_default(),
                    href("next"),
                    href("prev"),
                )
            });

        let pagination = Pagination::new(
            self.number(&data, &self.config.page),
            self.number(&data, &self.config.per_page),
            self.number(&data, &self.config.total_items),
            self.number(&data, &self.config.total_pages),
            links,
        );

        let entries = match data.get("_embedded") {
            Some(Value::Object(relations)) => relations.values().next().cloned(),
            Some(Value::Array(relations)) => relations.first().cloned(),
            _ => None,
        };
        (pagination, entries.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "page": 2,
            "perPage": 10,
            "totalItems": 35,
            "totalPages": 4,
            "_links": {
                "self": {"href": "http://domain.tld/things?page=2"},
                "first": {"href": "http://domain.tld/things?page=1"},
                "last": {"href": "http://domain.tld/things?page=4"},
                "next": {"href": "http://domain.tld/things?page=3"},
                "prev": {"href": "http://domain.tld/things?page=1"}
            },
            "_embedded": {
                "things": [{"id": 11}, {"id": 12}]
            }
        })
    }

    fn response() -> Response {
        Response::new(StatusCode::OK, HeaderMap::new(), "")
    }

    #[test]
    fn supports_complete_envelope() {
        let provider = HateoasPagination::default();
        let definition = ResponseDefinition::default();
        assert!(provider.support_pagination(&body(), &response(), &definition));

        let mut missing_last = body();
        missing_last["_links"]
            .as_object_mut()
            .unwrap()
            .remove("last");
        assert!(!provider.support_pagination(&missing_last, &response(), &definition));

        let mut missing_total = body();
        missing_total
            .as_object_mut()
            .unwrap()
            .remove("totalPages");
        assert!(!provider.support_pagination(&missing_total, &response(), &definition));
    }

    #[test]
    fn extracts_first_embedded_relation() {
        let (pagination, data) = HateoasPagination::default().get_pagination(
            body(),
            &response(),
            &ResponseDefinition::default(),
        );
        assert_eq!(data, json!([{"id": 11}, {"id": 12}]));
        assert_eq!(
            (pagination.page, pagination.per_page, pagination.total_items, pagination.total_pages),
            (2, 10, 35, 4)
        );
        let links = pagination.links.unwrap();
        assert_eq!(links.first, "http://domain.tld/things?page=1");
        assert_eq!(links.last, "http://domain.tld/things?page=4");
        assert_eq!(links.next.as_deref(), Some("http://domain.tld/things?page=3"));
        assert_eq!(links.prev.as_deref(), Some("http://domain.tld/things?page=1"));
    }

    #[test]
    fn custom_keys() {
        let provider = HateoasPagination::new(HateoasPaginationConfig {
            page: "current".to_string(),
            ..HateoasPaginationConfig::default()
        });
        let mut data = body();
        let page = data.as_object_mut().unwrap().remove("page").unwrap();
        data["current"] = page;
        assert!(provider.support_pagination(&data, &response(), &ResponseDefinition::default()));
    }
}
