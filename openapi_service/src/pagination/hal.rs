use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{as_int, leading_int, total_pages, PaginationProvider};
use crate::definition::ResponseDefinition;
use crate::message::Response;
use crate::types::{Pagination, PaginationLinks};

/// Dotted paths to the pagination values inside a HAL body.
///
/// A segment that lands on a string is read as a query key of that string,
/// so `_links.self.href.page` reads `page` from the `self` link URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HalPaginationConfig {
    pub page: String,
    pub per_page: String,
    pub total_items: String,
    pub total_pages: String,
}

impl Default for HalPaginationConfig {
    fn default() -> Self {
        Self {
            page: "_links.self.href.page".to_string(),
            per_page: "itemsPerPage".to_string(),
            total_items: "totalItems".to_string(),
            total_pages: "_links.last.href.page".to_string(),
        }
    }
}

/// Pagination for HAL collections (`_links` plus `_embedded.item`).
#[derive(Debug, Clone)]
pub struct HalProvider {
    page: Vec<String>,
    per_page: Vec<String>,
    total_items: Vec<String>,
    total_pages: Vec<String>,
}

impl Default for HalProvider {
    fn default() -> Self {
        Self::new(HalPaginationConfig::default())
    }
}

impl HalProvider {
    pub fn new(config: HalPaginationConfig) -> Self {
        let split = |path: &str| path.split('.').map(str::to_string).collect::<Vec<_>>();
        Self {
            page: split(&config.page),
            per_page: split(&config.per_page),
            total_items: split(&config.total_items),
            total_pages: split(&config.total_pages),
        }
    }
}

impl PaginationProvider for HalProvider {
    fn support_pagination(
        &self,
        data: &Value,
        _response: &Response,
        _definition: &ResponseDefinition,
    ) -> bool {
        let total_items = value_at(data, &self.total_items);
        if matches!(&total_items, Some(Value::Number(n)) if n.as_f64() == Some(0.0)) {
            return true;
        }
        let per_page = value_at(data, &self.per_page);

        // A single page has no `last` link to read the page count from.
        let single_page = match (&total_items, &per_page) {
            (Some(items), Some(per_page)) => as_int(items) <= as_int(per_page),
            _ => false,
        };
        let required = [&self.page, &self.per_page, &self.total_items]
            .into_iter()
            .chain((!single_page).then_some(&self.total_pages));
        for path in required {
            if value_at(data, path).is_none() {
                return false;
            }
        }

        data.get("_embedded")
            .and_then(|embedded| embedded.get("item"))
            .is_some_and(|item| !item.is_null())
    }

    fn get_pagination(
        &self,
        mut data: Value,
        _response: &Response,
        _definition: &ResponseDefinition,
    ) -> (Pagination, Value) {
        let href = |name: &str| {
            data.get("_links")
                .and_then(|links| links.get(name))
                .and_then(|link| link.get("href"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let links = PaginationLinks::new(
            href("first").or_else(|| href("self")).unwrap_or_default(),
            href("last").or_else(|| href("self")).unwrap_or_default(),
            href("next"),
            href("prev"),
        );

        let page = value_at(&data, &self.page).map_or(1, |v| as_int(&v));
        let per_page = value_at(&data, &self.per_page).map_or(0, |v| as_int(&v));
        let total_items = value_at(&data, &self.total_items).map_or(0, |v| as_int(&v));

        let items = data
            .get_mut("_embedded")
            .and_then(|embedded| embedded.get_mut("item"))
            .map(Value::take);
        let items = match items {
            Some(Value::Array(items)) => items.into_iter().map(flatten).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![flatten(other)],
        };

        tracing::debug!(
            "HAL pagination: page {} of {} items, {} per page",
            page,
            total_items,
            per_page
        );
        (
            Pagination::new(
                page,
                per_page,
                total_items,
                total_pages(total_items, per_page),
                Some(links),
            ),
            Value::Array(items),
        )
    }
}

/// Resolves a dotted path. A string reached before the path ends is searched
/// for the next segment as a query key; a string without that key gives 1.
fn value_at(data: &Value, path: &[String]) -> Option<Value> {
    let mut current = data;
    for (i, segment) in path.iter().enumerate() {
        if let Some(next) = current.get(segment.as_str()).filter(|v| !v.is_null()) {
            current = next;
            continue;
        }
        let Value::String(s) = current else {
            return None;
        };
        return match query_value(s, segment) {
            Some(n) if i + 1 == path.len() => Some(Value::from(n)),
            Some(_) => None,
            None => Some(Value::from(1)),
        };
    }
    Some(current.clone())
}

fn query_value(url: &str, key: &str) -> Option<i64> {
    let pattern = format!(r"(?:^|[?&]){}=([^&#]*)", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(url).map(|c| leading_int(&c[1]))
}

/// Lifts `_embedded` relations into sibling keys and drops `_links`, at
/// every level. Relations come first, the item's own keys win on clashes.
fn flatten(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            let mut own = Vec::new();
            for (key, value) in map {
                match key.as_str() {
                    "_links" => {}
                    "_embedded" => {
                        if let Value::Object(relations) = value {
                            for (name, relation) in relations {
                                out.insert(name, flatten(relation));
                            }
                        }
                    }
                    _ => own.push((key, value)),
                }
            }
            for (key, value) in own {
                out.insert(key, flatten(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(flatten).collect()),
        other => other,
    }
}
