//! Operation definitions consumed by the service.
//!
//! These mirror the parts of an OpenAPI/Swagger document the request builder
//! and the denormalizer need. Parsing a Swagger document into them is left to
//! the caller; [`StaticSchema`] is a ready-made in-memory [`Schema`] that can
//! also be deserialized from this crate's own JSON catalogue format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lookup of operations plus the scheme/host the API is served from.
pub trait Schema: Send + Sync {
    /// Returns the definition of `operation_id`, or `None` if it is not declared.
    fn request_definition(&self, operation_id: &str) -> Option<&RequestDefinition>;

    /// Declared schemes, in declaration order.
    fn schemes(&self) -> &[String];

    /// Declared host, if any.
    fn host(&self) -> Option<&str>;
}

/// Where a parameter travels in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared request parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    /// JSON schema of the value. A `default` keyword here is applied when the
    /// caller omits the parameter.
    #[serde(default)]
    pub schema: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            schema: Value::Object(Map::new()),
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The schema-level `default`, ignoring an explicit `null`.
    pub fn default_value(&self) -> Option<&Value> {
        self.schema.get("default").filter(|v| !v.is_null())
    }

    /// For a body parameter: the `default` of each top-level property that has one.
    pub fn property_defaults(&self) -> Map<String, Value> {
        let Some(properties) = self.schema.get("properties").and_then(Value::as_object) else {
            return Map::new();
        };
        properties
            .iter()
            .filter_map(|(name, property)| {
                property
                    .get("default")
                    .filter(|v| !v.is_null())
                    .map(|default| (name.clone(), default.clone()))
            })
            .collect()
    }
}

/// What the schema declares for one response status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    #[serde(default, rename = "schema", skip_serializing_if = "Option::is_none")]
    body_schema: Option<Value>,
}

static NO_BODY_RESPONSE: ResponseDefinition = ResponseDefinition { body_schema: None };

impl ResponseDefinition {
    pub fn new(body_schema: Option<Value>) -> Self {
        Self { body_schema }
    }

    pub fn with_schema(body_schema: Value) -> Self {
        Self::new(Some(body_schema))
    }

    pub fn has_body_schema(&self) -> bool {
        self.body_schema.is_some()
    }

    pub fn body_schema(&self) -> Option<&Value> {
        self.body_schema.as_ref()
    }
}

/// Everything needed to build a request for one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefinition {
    pub operation_id: String,
    pub method: String,
    pub path_template: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub accepts: Vec<String>,
    /// Keyed by status code (`"200"`) or `"default"`.
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseDefinition>,
}

impl RequestDefinition {
    pub fn new(
        operation_id: impl Into<String>,
        method: impl Into<String>,
        path_template: impl Into<String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            method: method.into(),
            path_template: path_template.into(),
            parameters: Vec::new(),
            content_types: Vec::new(),
            accepts: Vec::new(),
            responses: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_types.push(content_type.into());
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accepts.push(accept.into());
        self
    }

    pub fn with_response(mut self, status: impl ToString, response: ResponseDefinition) -> Self {
        self.responses.insert(status.to_string(), response);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The definition for `status`, falling back to `default`, then to a
    /// definition with no body schema.
    pub fn response_definition(&self, status: u16) -> &ResponseDefinition {
        self.responses
            .get(&status.to_string())
            .or_else(|| self.responses.get("default"))
            .unwrap_or(&NO_BODY_RESPONSE)
    }
}

/// An in-memory [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticSchema {
    #[serde(default)]
    schemes: Vec<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    operations: Vec<RequestDefinition>,
}

impl StaticSchema {
    pub fn new<S: Into<String>>(schemes: impl IntoIterator<Item = S>, host: Option<&str>) -> Self {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            host: host.map(str::to_string),
            operations: Vec::new(),
        }
    }

    /// Adds an operation, replacing any previous one with the same id.
    pub fn with_operation(mut self, definition: RequestDefinition) -> Self {
        self.operations
            .retain(|op| op.operation_id != definition.operation_id);
        self.operations.push(definition);
        self
    }

    pub fn operations(&self) -> &[RequestDefinition] {
        &self.operations
    }
}

impl Schema for StaticSchema {
    fn request_definition(&self, operation_id: &str) -> Option<&RequestDefinition> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }

    fn schemes(&self) -> &[String] {
        &self.schemes
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}
