//! Schema-driven HTTP API client.
//!
//! An [`ApiService`] turns an operation id and a parameter map into an HTTP
//! request using the operation's [`RequestDefinition`], sends it through an
//! injected [`HttpClient`], and denormalizes the response into a
//! [`Resource`]: an item, a (possibly paginated) collection, or an error.

mod builder;
mod client;
mod config;
pub mod definition;
mod denormalizer;
mod errors;
mod message;
pub mod pagination;
pub mod query;
mod request_builder;
pub mod serializer;
pub mod transport;
pub mod types;
pub mod uri_template;
pub mod validator;

pub use self::builder::ApiServiceBuilder;
pub use self::client::{ApiService, CallOutput};
pub use self::config::ApiServiceConfig;
pub use self::definition::{
    Parameter, ParameterLocation, RequestDefinition, ResponseDefinition, Schema, StaticSchema,
};
pub use self::denormalizer::{ResourceDenormalizer, ResponseContext};
pub use self::errors::{
    ApiServiceError, ConfigError, ConstraintViolations, SerializerError, TransportError,
    ViolationKind,
};
pub use self::message::{Params, Request, Response};
pub use self::request_builder::RequestBuilder;
pub use self::serializer::{FormatSerializer, JsonSerializer, Serializer, XmlSerializer};
pub use self::transport::{AsyncHttpClient, HttpClient, ReqwestClient, ResponseFuture};
pub use self::types::{Collection, ErrorResource, Item, Meta, Pagination, PaginationLinks, Resource};
pub use self::uri_template::{RfcUriTemplate, UriTemplate};
pub use self::validator::{ConstraintViolation, JsonSchemaValidator, MessageValidator};
