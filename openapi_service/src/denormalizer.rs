//! Turns decoded response bodies into [`Resource`]s.

use serde_json::Value;

use crate::definition::ResponseDefinition;
use crate::errors::ApiServiceError;
use crate::message::{Request, Response};
use crate::pagination::PaginationProvider;
use crate::types::{Collection, ErrorResource, Item, Meta, Resource};
use crate::validator::ConstraintViolation;

/// The exchange a body was decoded from.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub response: &'a Response,
    pub request: &'a Request,
    pub definition: &'a ResponseDefinition,
}

/// Builds items and collections from the response schema's root type.
///
/// An `array` schema gives a [`Collection`], paginated when the configured
/// provider recognises the response. Anything else gives an [`Item`].
#[derive(Default)]
pub struct ResourceDenormalizer {
    provider: Option<Box<dyn PaginationProvider>>,
}

impl ResourceDenormalizer {
    pub fn new(provider: Option<Box<dyn PaginationProvider>>) -> Self {
        Self { provider }
    }

    pub fn with_pagination_provider(provider: impl PaginationProvider + 'static) -> Self {
        Self::new(Some(Box::new(provider)))
    }

    pub fn denormalize(
        &self,
        data: Value,
        context: &ResponseContext<'_>,
    ) -> Result<Resource, ApiServiceError> {
        let ResponseContext {
            response,
            request,
            definition,
        } = *context;

        let Some(schema) = definition.body_schema() else {
            return Err(ApiServiceError::MissingResponseSchema {
                status: response.status().as_u16(),
                method: request.method().to_string(),
                path: request.uri().path().to_string(),
            });
        };
        let meta = Meta::from_headers(response.headers());

        if schema_type(schema)? != "array" {
            return Ok(Resource::Item(Item::new(data, meta)));
        }

        let (pagination, data) = match &self.provider {
            Some(provider) if provider.support_pagination(&data, response, definition) => {
                let (pagination, data) = provider.get_pagination(data, response, definition);
                tracing::debug!(
                    "Paginated collection: page {}/{} ({} items)",
                    pagination.page,
                    pagination.total_pages,
                    pagination.total_items
                );
                (Some(pagination), data)
            }
            Some(_) => {
                tracing::debug!(
                    "Pagination provider declined the response of {} {}",
                    request.method(),
                    request.uri().path()
                );
                (None, data)
            }
            None => (None, data),
        };

        Ok(Resource::Collection(Collection::new(data, meta, pagination)))
    }

    /// Error resource for a 4xx/5xx response. Violations come from the
    /// body's top-level `violations` list and are dropped if malformed.
    pub fn denormalize_error(&self, data: &Value, context: &ResponseContext<'_>) -> Resource {
        let status = context.response.status();
        let violations = data
            .get("violations")
            .and_then(|v| serde_json::from_value::<Vec<ConstraintViolation>>(v.clone()).ok())
            .unwrap_or_default();
        Resource::Error(ErrorResource::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            violations,
        ))
    }
}

/// `type`, else `allOf[0].type`.
fn schema_type(schema: &Value) -> Result<&str, ApiServiceError> {
    declared_type(schema)
        .or_else(|| {
            schema
                .get("allOf")
                .and_then(|all| all.get(0))
                .and_then(declared_type)
        })
        .ok_or(ApiServiceError::UnknownSchemaType)
}

/// A list of types resolves to its first entry.
fn declared_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types.iter().find_map(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::HeaderPagination;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use url::Url;

    fn request() -> Request {
        Request::new(
            Method::GET,
            Url::parse("https://domain.tld/things").unwrap(),
            HeaderMap::new(),
            None,
        )
    }

    fn response(status: StatusCode, extra: &[(&'static str, &'static str)]) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in extra {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        Response::new(status, headers, "")
    }

    fn denormalize(
        denormalizer: &ResourceDenormalizer,
        data: Value,
        response: &Response,
        definition: &ResponseDefinition,
    ) -> Result<Resource, ApiServiceError> {
        let request = request();
        denormalizer.denormalize(
            data,
            &ResponseContext {
                response,
                request: &request,
                definition,
            },
        )
    }

    #[test]
    fn object_schema_gives_item() {
        let definition = ResponseDefinition::with_schema(json!({"type": "object"}));
        let resource = denormalize(
            &ResourceDenormalizer::default(),
            json!({"foo": "bar"}),
            &response(StatusCode::OK, &[]),
            &definition,
        )
        .unwrap();
        let item = resource.as_item().unwrap();
        assert_eq!(item.data, json!({"foo": "bar"}));
        assert_eq!(item.meta.header("content-type"), Some("application/json"));
    }

    #[test]
    fn all_of_type_is_used_as_fallback() {
        let definition = ResponseDefinition::with_schema(json!({"allOf": [{"type": "object"}]}));
        let resource = denormalize(
            &ResourceDenormalizer::default(),
            json!({}),
            &response(StatusCode::OK, &[]),
            &definition,
        )
        .unwrap();
        assert!(resource.as_item().is_some());
    }

    #[test]
    fn unknown_schema_type_is_an_error() {
        let definition = ResponseDefinition::with_schema(json!({"properties": {}}));
        let err = denormalize(
            &ResourceDenormalizer::default(),
            json!({}),
            &response(StatusCode::OK, &[]),
            &definition,
        )
        .unwrap_err();
        assert!(matches!(err, ApiServiceError::UnknownSchemaType));
    }

    #[test]
    fn missing_schema_is_an_error() {
        let err = denormalize(
            &ResourceDenormalizer::default(),
            json!({}),
            &response(StatusCode::OK, &[]),
            &ResponseDefinition::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiServiceError::MissingResponseSchema { status: 200, ref path, .. } if path == "/things"
        ));
    }

    #[test]
    fn array_schema_without_provider_gives_plain_collection() {
        let definition = ResponseDefinition::with_schema(json!({"type": "array"}));
        let resource = denormalize(
            &ResourceDenormalizer::default(),
            json!([{"id": 1}, {"id": 2}]),
            &response(StatusCode::OK, &[]),
            &definition,
        )
        .unwrap();
        let collection = resource.as_collection().unwrap();
        assert_eq!(collection.len(), 2);
        assert!(!collection.has_pagination());
    }

    #[test]
    fn provider_is_consulted_for_collections() {
        let denormalizer = ResourceDenormalizer::with_pagination_provider(HeaderPagination::default());
        let definition = ResponseDefinition::with_schema(json!({"type": "array"}));

        let paged = response(
            StatusCode::OK,
            &[
                ("X-Page", "1"),
                ("X-Per-Page", "2"),
                ("X-Total-Items", "2"),
                ("X-Total-Pages", "1"),
            ],
        );
        let resource = denormalize(&denormalizer, json!([1, 2]), &paged, &definition).unwrap();
        let pagination = resource.as_collection().unwrap().pagination().unwrap();
        assert_eq!(pagination.total_items, 2);

        let unpaged = response(StatusCode::OK, &[]);
        let resource = denormalize(&denormalizer, json!([1, 2]), &unpaged, &definition).unwrap();
        assert!(!resource.as_collection().unwrap().has_pagination());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logs_of_declined_page(level: tracing::Level) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let denormalizer =
                ResourceDenormalizer::with_pagination_provider(HeaderPagination::default());
            let definition = ResponseDefinition::with_schema(json!({"type": "array"}));
            let resource = denormalize(
                &denormalizer,
                json!([1]),
                &response(StatusCode::OK, &[]),
                &definition,
            )
            .unwrap();
            assert!(!resource.as_collection().unwrap().has_pagination());
        });

        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn declined_pagination_is_only_logged_at_debug() {
        assert!(!logs_of_declined_page(tracing::Level::INFO).contains("declined"));
        assert!(logs_of_declined_page(tracing::Level::DEBUG).contains("declined"));
    }

    #[test]
    fn error_resource_reads_violations() {
        let request = request();
        let response = response(StatusCode::BAD_REQUEST, &[]);
        let definition = ResponseDefinition::with_schema(json!({"type": "object"}));
        let resource = ResourceDenormalizer::default().denormalize_error(
            &json!({"violations": [
                {"property": "name", "message": "required", "constraint": "required", "location": "body"}
            ]}),
            &ResponseContext {
                response: &response,
                request: &request,
                definition: &definition,
            },
        );
        let error = resource.as_error().unwrap();
        assert_eq!(error.code, 400);
        assert_eq!(error.message, "Bad Request");
        assert_eq!(error.violations.len(), 1);
        assert_eq!(error.violations[0].property, "name");
    }
}
