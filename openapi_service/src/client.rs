//! The API service: build, validate, send, denormalize.

use std::future::Future;

use serde_json::Value;
use url::Url;

use crate::config::{parse_base_uri, ApiServiceConfig};
use crate::definition::{RequestDefinition, ResponseDefinition, Schema};
use crate::denormalizer::{ResourceDenormalizer, ResponseContext};
use crate::errors::{ApiServiceError, ConfigError, ConstraintViolations, ViolationKind};
use crate::message::{Params, Request, Response};
use crate::request_builder::RequestBuilder;
use crate::serializer::{format_from_content_type, Serializer};
use crate::transport::HttpClient;
use crate::types::{Item, Meta, Resource};
use crate::uri_template::UriTemplate;
use crate::validator::MessageValidator;

/// What a call returns: a resource, or the raw response when the service is
/// configured with `return_response`.
#[derive(Debug, Clone)]
pub enum CallOutput {
    Resource(Resource),
    Response(Response),
}

impl CallOutput {
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            CallOutput::Resource(resource) => Some(resource),
            CallOutput::Response(_) => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            CallOutput::Resource(resource) => Some(resource),
            CallOutput::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            CallOutput::Response(response) => Some(response),
            CallOutput::Resource(_) => None,
        }
    }
}

/// Calls the operations of a [`Schema`].
///
/// Built through [`ApiServiceBuilder`](crate::ApiServiceBuilder). The base
/// URI is resolved once, at build time. A service holds no per-call state and
/// can be shared between threads.
pub struct ApiService {
    base_uri: Url,
    schema: Box<dyn Schema>,
    http_client: Box<dyn HttpClient>,
    uri_template: Box<dyn UriTemplate>,
    serializer: Box<dyn Serializer>,
    validator: Box<dyn MessageValidator>,
    denormalizer: ResourceDenormalizer,
    config: ApiServiceConfig,
}

impl ApiService {
    pub(crate) fn new(
        schema: Box<dyn Schema>,
        http_client: Box<dyn HttpClient>,
        uri_template: Box<dyn UriTemplate>,
        serializer: Box<dyn Serializer>,
        validator: Box<dyn MessageValidator>,
        denormalizer: ResourceDenormalizer,
        config: ApiServiceConfig,
    ) -> Result<Self, ConfigError> {
        let base_uri = resolve_base_uri(&config, schema.as_ref())?;
        tracing::debug!("Resolved base URI {}", base_uri);
        Ok(Self {
            base_uri,
            schema,
            http_client,
            uri_template,
            serializer,
            validator,
            denormalizer,
            config,
        })
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    pub fn config(&self) -> &ApiServiceConfig {
        &self.config
    }

    /// Calls `operation_id` and blocks until the response is denormalized.
    ///
    /// Must not run on an async executor thread: a blocking transport such as
    /// [`ReqwestClient`](crate::ReqwestClient) panics there. Use
    /// [`call_async`](Self::call_async) from async code.
    pub fn call(&self, operation_id: &str, params: &Params) -> Result<CallOutput, ApiServiceError> {
        let definition = self.request_definition(operation_id)?;
        let request = self.build_request(definition, params)?;
        self.validate_request(&request, definition)?;

        let response = self.http_client.send_request(&request)?;
        self.handle_response(response, &request, definition)
    }

    /// Builds and validates the request now, and returns a future that sends
    /// it and denormalizes the response.
    ///
    /// Fails immediately with [`ApiServiceError::UnsupportedOperation`] when
    /// the transport has no async side.
    pub fn call_async<'a>(
        &'a self,
        operation_id: &str,
        params: &Params,
    ) -> Result<impl Future<Output = Result<CallOutput, ApiServiceError>> + Send + 'a, ApiServiceError>
    {
        let client = self.http_client.as_async().ok_or_else(|| {
            ApiServiceError::UnsupportedOperation(self.http_client.name().to_string())
        })?;
        let definition = self.request_definition(operation_id)?;
        let request = self.build_request(definition, params)?;
        self.validate_request(&request, definition)?;

        Ok(async move {
            let response = client.send_async_request(&request).await?;
            self.handle_response(response, &request, definition)
        })
    }

    fn request_definition(&self, operation_id: &str) -> Result<&RequestDefinition, ApiServiceError> {
        self.schema
            .request_definition(operation_id)
            .ok_or_else(|| ApiServiceError::UnknownOperation(operation_id.to_string()))
    }

    fn build_request(
        &self,
        definition: &RequestDefinition,
        params: &Params,
    ) -> Result<Request, ApiServiceError> {
        RequestBuilder::new(
            &self.base_uri,
            self.uri_template.as_ref(),
            self.serializer.as_ref(),
        )
        .build(definition, params)
    }

    fn validate_request(
        &self,
        request: &Request,
        definition: &RequestDefinition,
    ) -> Result<(), ApiServiceError> {
        if !self.config.validate_request {
            return Ok(());
        }
        let violations = self.validator.validate_request(request, definition);
        if violations.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            "{} request violations for {}",
            violations.len(),
            definition.operation_id
        );
        Err(ApiServiceError::RequestViolations(ConstraintViolations::new(
            ViolationKind::Request,
            violations,
        )))
    }

    fn validate_response(
        &self,
        response: &Response,
        definition: &RequestDefinition,
    ) -> Result<(), ApiServiceError> {
        if !self.config.validate_response {
            return Ok(());
        }
        let violations = self.validator.validate_response(response, definition);
        if violations.is_empty() {
            return Ok(());
        }
        Err(ApiServiceError::ResponseViolations(ConstraintViolations::new(
            ViolationKind::Response,
            violations,
        )))
    }

    fn handle_response(
        &self,
        response: Response,
        request: &Request,
        definition: &RequestDefinition,
    ) -> Result<CallOutput, ApiServiceError> {
        if self.config.return_response {
            return Ok(CallOutput::Response(response));
        }
        self.validate_response(&response, definition)?;

        let response_definition = definition.response_definition(response.status().as_u16());
        self.data_from_response(&response, response_definition, request)
            .map(CallOutput::Resource)
    }

    fn data_from_response(
        &self,
        response: &Response,
        definition: &ResponseDefinition,
        request: &Request,
    ) -> Result<Resource, ApiServiceError> {
        let content_type = response.content_type();
        if !definition.has_body_schema() || content_type.is_empty() {
            return Ok(Resource::Item(Item::empty(Meta::from_headers(
                request.headers(),
            ))));
        }

        let format = format_from_content_type(&content_type);
        let is_error = (400..=599).contains(&response.status().as_u16());
        let data = if response.body().trim().is_empty() {
            Value::Null
        } else {
            match self.serializer.deserialize(response.body(), format) {
                Ok(data) => data,
                Err(e) if is_error => {
                    tracing::warn!("Could not decode error response body: {}", e);
                    Value::Null
                }
                Err(e) => return Err(e.into()),
            }
        };

        let context = ResponseContext {
            response,
            request,
            definition,
        };
        if is_error {
            return Ok(self.denormalizer.denormalize_error(&data, &context));
        }
        self.denormalizer.denormalize(data, &context)
    }
}

/// An explicit `base_uri` wins. Otherwise `https` is preferred over `http`
/// among the schema's schemes, joined with the schema's host.
pub(crate) fn resolve_base_uri(
    config: &ApiServiceConfig,
    schema: &dyn Schema,
) -> Result<Url, ConfigError> {
    if let Some(uri) = &config.base_uri {
        return parse_base_uri(uri);
    }

    let schemes = schema.schemes();
    if schemes.is_empty() {
        return Err(ConfigError::NoSchemeDeclared);
    }
    let scheme = if schemes.iter().any(|s| s == "https") {
        "https"
    } else if schemes.iter().any(|s| s == "http") {
        "http"
    } else {
        return Err(ConfigError::UnsupportedScheme(schemes.to_vec()));
    };

    let host = schema
        .host()
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .ok_or(ConfigError::MissingHost)?;
    parse_base_uri(&format!("{}://{}", scheme, host))
}
