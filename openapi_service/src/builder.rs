use std::time::Duration;

use crate::client::ApiService;
use crate::config::ApiServiceConfig;
use crate::definition::Schema;
use crate::denormalizer::ResourceDenormalizer;
use crate::errors::{ApiServiceError, ConfigError};
use crate::pagination::PaginationProvider;
use crate::serializer::{FormatSerializer, Serializer};
use crate::transport::{HttpClient, ReqwestClient};
use crate::uri_template::{RfcUriTemplate, UriTemplate};
use crate::validator::{JsonSchemaValidator, MessageValidator};

/// Assembles an [`ApiService`].
///
/// The serializer, URI template and validator default to [`FormatSerializer`],
/// [`RfcUriTemplate`] and [`JsonSchemaValidator`]. A transport must always be
/// supplied.
///
/// ```no_run
/// use openapi_service::{ApiServiceBuilder, StaticSchema};
///
/// let schema = StaticSchema::new(["https"], Some("api.domain.tld"));
/// let service = ApiServiceBuilder::new()
///     .with_reqwest_client()?
///     .enable_response_validation()
///     .build(schema)?;
/// # Ok::<(), openapi_service::ApiServiceError>(())
/// ```
#[derive(Default)]
pub struct ApiServiceBuilder {
    http_client: Option<Box<dyn HttpClient>>,
    serializer: Option<Box<dyn Serializer>>,
    uri_template: Option<Box<dyn UriTemplate>>,
    validator: Option<Box<dyn MessageValidator>>,
    pagination_provider: Option<Box<dyn PaginationProvider>>,
    config: ApiServiceConfig,
}

impl ApiServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.http_client = Some(Box::new(client));
        self
    }

    /// Uses a [`ReqwestClient`] with the default timeout.
    pub fn with_reqwest_client(self) -> Result<Self, ApiServiceError> {
        Ok(self.with_http_client(ReqwestClient::new()?))
    }

    pub fn with_reqwest_client_timeout(self, timeout: Duration) -> Result<Self, ApiServiceError> {
        Ok(self.with_http_client(ReqwestClient::with_timeout(timeout)?))
    }

    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Box::new(serializer));
        self
    }

    pub fn with_uri_template(mut self, uri_template: impl UriTemplate + 'static) -> Self {
        self.uri_template = Some(Box::new(uri_template));
        self
    }

    pub fn with_message_validator(mut self, validator: impl MessageValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn with_pagination_provider(mut self, provider: impl PaginationProvider + 'static) -> Self {
        self.pagination_provider = Some(Box::new(provider));
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.config.base_uri = Some(base_uri.into());
        self
    }

    pub fn disable_request_validation(mut self) -> Self {
        self.config.validate_request = false;
        self
    }

    pub fn enable_response_validation(mut self) -> Self {
        self.config.validate_response = true;
        self
    }

    pub fn return_response(mut self) -> Self {
        self.config.return_response = true;
        self
    }

    /// Replaces every option set so far.
    pub fn with_config(mut self, config: ApiServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self, schema: impl Schema + 'static) -> Result<ApiService, ApiServiceError> {
        self.config.validate()?;
        let http_client = self.http_client.ok_or(ConfigError::MissingHttpClient)?;

        let service = ApiService::new(
            Box::new(schema),
            http_client,
            self.uri_template
                .unwrap_or_else(|| Box::new(RfcUriTemplate)),
            self.serializer.unwrap_or_else(|| Box::new(FormatSerializer)),
            self.validator
                .unwrap_or_else(|| Box::new(JsonSchemaValidator)),
            ResourceDenormalizer::new(self.pagination_provider),
            self.config,
        )?;
        Ok(service)
    }
}
