//! Denormalized call results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::meta::{Meta, Pagination};
use crate::validator::ConstraintViolation;

/// The outcome of a denormalized call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resource {
    Item(Item),
    Collection(Collection),
    Error(ErrorResource),
}

impl Resource {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Resource::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Resource::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorResource> {
        match self {
            Resource::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Decoded data of an item or collection. `None` for errors.
    pub fn data(&self) -> Option<Value> {
        match self {
            Resource::Item(item) => Some(item.data.clone()),
            Resource::Collection(collection) => Some(Value::Array(collection.data.clone())),
            Resource::Error(_) => None,
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Resource::Item(item) => Some(&item.meta),
            Resource::Collection(collection) => Some(&collection.meta),
            Resource::Error(_) => None,
        }
    }
}

/// A single decoded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub data: Value,
    pub meta: Meta,
}

impl Item {
    pub fn new(data: Value, meta: Meta) -> Self {
        Self { data, meta }
    }

    /// An item with no data, used when no body is expected or decodable.
    pub fn empty(meta: Meta) -> Self {
        Self::new(Value::Object(Map::new()), meta)
    }

    pub fn is_empty(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// An ordered list of entries, optionally paginated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub data: Vec<Value>,
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl Collection {
    /// Builds a collection from decoded data: an array gives its elements,
    /// `null` gives no entry and any other value is a single entry.
    pub fn new(data: Value, meta: Meta, pagination: Option<Pagination>) -> Self {
        let data = match data {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        Self {
            data,
            meta,
            pagination,
        }
    }

    pub fn has_pagination(&self) -> bool {
        self.pagination.is_some()
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl IntoIterator for Collection {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// An API error response (status 400 to 599).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResource {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub violations: Vec<ConstraintViolation>,
}

impl ErrorResource {
    pub fn new(code: u16, message: impl Into<String>, violations: Vec<ConstraintViolation>) -> Self {
        Self {
            code,
            message: message.into(),
            violations,
        }
    }
}
