//! Query-string and scalar-value helpers shared by the request builder.

use serde_json::Value;

use crate::message::Params;

/// Renders a scalar parameter value the way it travels on the wire.
///
/// Strings are used verbatim, numbers as their JSON text and booleans as
/// `true`/`false`. Returns `None` for `null`. Arrays and objects fall back to
/// their JSON text.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Flattens query parameters into ordered `(key, value)` pairs.
///
/// Arrays repeat the key once per element, objects expand to `key[prop]`,
/// and `null` values are dropped.
pub(crate) fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = value_to_string(item) {
                        pairs.push((key.clone(), s));
                    }
                }
            }
            Value::Object(map) => {
                for (prop, item) in map {
                    if let Some(s) = value_to_string(item) {
                        pairs.push((format!("{}[{}]", key, prop), s));
                    }
                }
            }
            other => {
                if let Some(s) = value_to_string(other) {
                    pairs.push((key.clone(), s));
                }
            }
        }
    }
    pairs
}

/// Prepares a caller parameter map for query use.
///
/// Underscores in keys become dots (`filter_name` → `filter.name`), and an
/// object value keyed by names (not indexes) is flattened into `key[prop]`
/// entries. List-like values are kept as they are.
pub fn build_query(params: &Params) -> Params {
    let mut query = Params::new();
    for (key, item) in params {
        let dotted = key.replace('_', ".");
        match item {
            Value::Object(map) if !map.keys().any(|k| k.parse::<usize>().is_ok()) => {
                for (property, value) in map {
                    query.insert(format!("{}[{}]", dotted, property), value.clone());
                }
            }
            other => {
                query.insert(dotted, other.clone());
            }
        }
    }
    query
}
