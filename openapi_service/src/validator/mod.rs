//! Request/response validation against the operation definition.

mod json_schema;

pub use self::json_schema::JsonSchemaValidator;

use serde::{Deserialize, Serialize};

use crate::definition::RequestDefinition;
use crate::message::{Request, Response};

/// A single schema violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintViolation {
    /// Path of the offending value (`name`, `body/items/0`, ...).
    pub property: String,
    pub message: String,
    /// Name of the failed keyword (`required`, `type`, `enum`, ...).
    pub constraint: String,
    /// `path`, `query`, `header`, `body` or `formData`.
    pub location: String,
}

impl ConstraintViolation {
    pub fn new(
        property: impl Into<String>,
        message: impl Into<String>,
        constraint: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
            constraint: constraint.into(),
            location: location.into(),
        }
    }
}

/// Checks messages against a [`RequestDefinition`].
///
/// Each call returns the violations it found, in order. An empty list means
/// the message conforms.
pub trait MessageValidator: Send + Sync {
    fn validate_request(
        &self,
        request: &Request,
        definition: &RequestDefinition,
    ) -> Vec<ConstraintViolation>;

    fn validate_response(
        &self,
        response: &Response,
        definition: &RequestDefinition,
    ) -> Vec<ConstraintViolation>;
}
