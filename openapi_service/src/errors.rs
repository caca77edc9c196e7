//! Error types for the API service.

use std::fmt;

use crate::validator::ConstraintViolation;

/// Errors that can occur while building a service or performing a call.
#[derive(thiserror::Error, Debug)]
pub enum ApiServiceError {
    /// The service could not be configured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The schema does not declare the requested operation.
    #[error("Unknown operationId {0}")]
    UnknownOperation(String),
    /// A caller-supplied parameter is not declared on the operation.
    #[error("{name} is not a defined request parameter for operationId {operation_id}")]
    InvalidParameter { name: String, operation_id: String },
    /// The operation declares an HTTP method that cannot be sent.
    #[error("Invalid HTTP method {method} for operationId {operation_id}")]
    InvalidMethod { method: String, operation_id: String },
    /// A header name or value cannot be encoded.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    /// Both a JSON body and form fields were produced for one request.
    #[error("operationId {operation_id} cannot send a body and form data in the same request")]
    ConflictingBody { operation_id: String },
    /// Request validation reported violations. Nothing was sent.
    #[error("{0}")]
    RequestViolations(ConstraintViolations),
    /// Response validation reported violations. Nothing was denormalized.
    #[error("{0}")]
    ResponseViolations(ConstraintViolations),
    /// The response schema has neither `type` nor `allOf[0].type`.
    #[error("Cannot extract type from schema")]
    UnknownSchemaType,
    /// A resource was requested for a response without a body schema.
    #[error(
        "Cannot transform the response into a resource. You need to provide a schema for response {status} in {method} {path}"
    )]
    MissingResponseSchema {
        status: u16,
        method: String,
        path: String,
    },
    /// `call_async` was used with a transport that only sends blocking requests.
    #[error("\"{0}\" does not support async request")]
    UnsupportedOperation(String),
    /// Encoding a request body or decoding a response body failed.
    #[error(transparent)]
    Serializer(#[from] SerializerError),
    /// The transport failed to deliver the request.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiServiceError {
    /// Returns the violation list for request or response violations.
    pub fn violations(&self) -> Option<&ConstraintViolations> {
        match self {
            Self::RequestViolations(v) | Self::ResponseViolations(v) => Some(v),
            _ => None,
        }
    }
}

/// Construction-time failures. A service that hits one of these is never built.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("You need to provide at least one scheme in your API schema")]
    NoSchemeDeclared,
    #[error("Cannot choose a proper scheme from the API schema. Supported: https, http")]
    UnsupportedScheme(Vec<String>),
    #[error("The host in the API schema should not be empty")]
    MissingHost,
    #[error("Invalid base URI {uri}: {reason}")]
    InvalidBaseUri { uri: String, reason: String },
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("No HTTP client was provided")]
    MissingHttpClient,
}

/// Errors raised by a [`Serializer`](crate::serializer::Serializer).
#[derive(thiserror::Error, Debug)]
pub enum SerializerError {
    #[error("Unsupported format {0}")]
    UnsupportedFormat(String),
    #[error("Failed to encode body: {0}")]
    Encode(String),
    #[error("Failed to decode body: {0}")]
    Decode(String),
}

/// Errors raised by an [`HttpClient`](crate::transport::HttpClient).
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Network error")]
    Network(#[from] reqwest::Error),
    #[error("Failed to read response body: {0}")]
    Body(String),
    #[error("{0}")]
    Other(String),
}

/// Which side of the exchange produced a set of violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Request,
    Response,
}

/// A non-empty list of constraint violations reported by the message validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolations {
    kind: ViolationKind,
    violations: Vec<ConstraintViolation>,
}

impl ConstraintViolations {
    pub fn new(kind: ViolationKind, violations: Vec<ConstraintViolation>) -> Self {
        Self { kind, violations }
    }

    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }
}

impl fmt::Display for ConstraintViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Request => f.write_str("Request constraint violations:\n")?,
            ViolationKind::Response => f.write_str("Response constraint violations:\n")?,
        }
        for violation in &self.violations {
            write!(
                f,
                "[property]: {}\n[message]: {}\n[constraint]: {}\n[location]: {}\n\n",
                violation.property, violation.message, violation.constraint, violation.location
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation() -> ConstraintViolation {
        ConstraintViolation::new("id", "The property id is required", "required", "query")
    }

    #[test]
    fn request_violations_message() {
        let err = ApiServiceError::RequestViolations(ConstraintViolations::new(
            ViolationKind::Request,
            vec![violation()],
        ));
        assert_eq!(
            err.to_string(),
            "Request constraint violations:\n[property]: id\n[message]: The property id is required\n[constraint]: required\n[location]: query\n\n"
        );
        assert_eq!(err.violations().unwrap().violations().len(), 1);
    }

    #[test]
    fn response_violations_use_their_own_header() {
        let violations = ConstraintViolations::new(
            ViolationKind::Response,
            vec![violation(), violation()],
        );
        let message = violations.to_string();
        assert!(message.starts_with("Response constraint violations:\n"));
        assert_eq!(message.matches("[property]: id\n").count(), 2);
        assert!(message.ends_with("[location]: query\n\n"));
    }

    #[test]
    fn other_errors_have_no_violations() {
        let err = ApiServiceError::UnknownSchemaType;
        assert!(err.violations().is_none());
        assert_eq!(err.to_string(), "Cannot extract type from schema");
    }

    #[test]
    fn unsupported_operation_names_the_transport() {
        let err = ApiServiceError::UnsupportedOperation("my::Client".to_string());
        assert_eq!(err.to_string(), "\"my::Client\" does not support async request");
    }
}
