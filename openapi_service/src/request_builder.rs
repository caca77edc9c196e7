//! Maps an operation and its parameters onto an HTTP request.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{Map, Value};
use url::{form_urlencoded, Url};

use crate::definition::{ParameterLocation, RequestDefinition};
use crate::errors::ApiServiceError;
use crate::message::{Params, Request};
use crate::query::{query_pairs, value_to_string};
use crate::serializer::{format_from_content_type, Serializer};
use crate::uri_template::UriTemplate;

const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Builds [`Request`]s against a fixed base URI.
///
/// Parameters are routed by their declared location. Declared defaults fill
/// in parameters the caller left out; a supplied value always wins, whatever
/// it is. Body property defaults are always laid down first and supplied body
/// fields are merged over them.
#[derive(Clone, Copy)]
pub struct RequestBuilder<'a> {
    base_uri: &'a Url,
    uri_template: &'a dyn UriTemplate,
    serializer: &'a dyn Serializer,
}

#[derive(Default)]
struct Buckets {
    path: Map<String, Value>,
    query: Params,
    headers: Map<String, Value>,
    body: Option<Value>,
    form: Map<String, Value>,
}

impl Buckets {
    fn route(&mut self, location: ParameterLocation, name: &str, value: Value) {
        match location {
            ParameterLocation::Path => {
                self.path.insert(name.to_string(), value);
            }
            ParameterLocation::Query => {
                self.query.insert(name.to_string(), value);
            }
            ParameterLocation::Header => {
                self.headers.insert(name.to_string(), value);
            }
            ParameterLocation::FormData => {
                self.form.insert(name.to_string(), value);
            }
            ParameterLocation::Body => self.merge_body(value),
        }
    }

    fn merge_body(&mut self, value: Value) {
        match (self.body.take(), value) {
            (Some(Value::Object(mut body)), Value::Object(fields)) => {
                body.extend(fields);
                self.body = Some(Value::Object(body));
            }
            (_, value) => self.body = Some(value),
        }
    }
}

impl<'a> RequestBuilder<'a> {
    pub fn new(
        base_uri: &'a Url,
        uri_template: &'a dyn UriTemplate,
        serializer: &'a dyn Serializer,
    ) -> Self {
        Self {
            base_uri,
            uri_template,
            serializer,
        }
    }

    pub fn build(
        &self,
        definition: &RequestDefinition,
        params: &Params,
    ) -> Result<Request, ApiServiceError> {
        if let Some(name) = params.keys().find(|name| definition.parameter(name).is_none()) {
            return Err(ApiServiceError::InvalidParameter {
                name: name.clone(),
                operation_id: definition.operation_id.clone(),
            });
        }

        let content_type = definition
            .content_types
            .first()
            .map_or(DEFAULT_MEDIA_TYPE, String::as_str);
        let accept = definition
            .accepts
            .first()
            .map_or(DEFAULT_MEDIA_TYPE, String::as_str);

        let mut buckets = Buckets::default();
        buckets
            .headers
            .insert("Content-Type".to_string(), Value::from(content_type));
        buckets
            .headers
            .insert("Accept".to_string(), Value::from(accept));

        for parameter in &definition.parameters {
            match parameter.location {
                // Supplied body fields are merged over these below.
                ParameterLocation::Body => {
                    let defaults = parameter.property_defaults();
                    if !defaults.is_empty() {
                        buckets.merge_body(Value::Object(defaults));
                    }
                }
                _ if params.contains_key(&parameter.name) => {}
                location => {
                    if let Some(default) = parameter.default_value() {
                        buckets.route(location, &parameter.name, default.clone());
                    }
                }
            }
        }

        for (name, value) in params {
            if let Some(parameter) = definition.parameter(name) {
                buckets.route(parameter.location, name, value.clone());
            }
        }

        let body = self.encode_body(definition, content_type, &buckets)?;
        let method = Method::from_bytes(definition.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ApiServiceError::InvalidMethod {
                method: definition.method.clone(),
                operation_id: definition.operation_id.clone(),
            })?;
        let uri = self.build_uri(&definition.path_template, &buckets.path, &buckets.query);
        let headers = header_map(&buckets.headers)?;

        tracing::debug!("Built {} request for {}: {}", method, definition.operation_id, uri);
        Ok(Request::new(method, uri, headers, body))
    }

    fn encode_body(
        &self,
        definition: &RequestDefinition,
        content_type: &str,
        buckets: &Buckets,
    ) -> Result<Option<String>, ApiServiceError> {
        if !buckets.form.is_empty() {
            if buckets.body.is_some() {
                return Err(ApiServiceError::ConflictingBody {
                    operation_id: definition.operation_id.clone(),
                });
            }
            let mut form = form_urlencoded::Serializer::new(String::new());
            for (name, value) in &buckets.form {
                if let Some(value) = value_to_string(value) {
                    form.append_pair(name, &value);
                }
            }
            return Ok(Some(form.finish()));
        }

        match &buckets.body {
            Some(body) => {
                let encoded = self
                    .serializer
                    .serialize(body, format_from_content_type(content_type))?;
                Ok(Some(encoded))
            }
            None => Ok(None),
        }
    }

    /// Base URI path, then the expanded template, then the query (only when
    /// at least one pair resolved).
    fn build_uri(&self, template: &str, path: &Map<String, Value>, query: &Params) -> Url {
        let expanded = self.uri_template.expand(template, path);
        let prefix = self.base_uri.path().trim_end_matches('/');
        let joined = if expanded.starts_with('/') {
            format!("{}{}", prefix, expanded)
        } else {
            format!("{}/{}", prefix, expanded)
        };

        let mut uri = self.base_uri.clone();
        uri.set_path(&joined);
        uri.set_query(None);
        uri.set_fragment(None);

        let pairs = query_pairs(query);
        if !pairs.is_empty() {
            uri.query_pairs_mut().extend_pairs(pairs);
        }
        uri
    }
}

fn header_map(headers: &Map<String, Value>) -> Result<HeaderMap, ApiServiceError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiServiceError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let values = match value {
            Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
            other => value_to_string(other).into_iter().collect::<Vec<_>>(),
        };
        // Replace anything a default or the seeded media types put there.
        map.remove(&header_name);
        for value in values {
            let header_value =
                HeaderValue::from_str(&value).map_err(|e| ApiServiceError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            map.append(header_name.clone(), header_value);
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Parameter;
    use crate::errors::SerializerError;
    use crate::serializer::FormatSerializer;
    use crate::uri_template::RfcUriTemplate;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn build(base: &str, definition: &RequestDefinition, value: Value) -> Result<Request, ApiServiceError> {
        let base = Url::parse(base).unwrap();
        RequestBuilder::new(&base, &RfcUriTemplate, &FormatSerializer).build(definition, &params(value))
    }

    fn every_location() -> RequestDefinition {
        RequestDefinition::new("updateThing", "patch", "/things/{id}")
            .with_parameter(Parameter::new("id", ParameterLocation::Path))
            .with_parameter(Parameter::new("dryRun", ParameterLocation::Query))
            .with_parameter(Parameter::new("X-Request-Id", ParameterLocation::Header))
            .with_parameter(Parameter::new("body", ParameterLocation::Body))
    }

    #[test]
    fn routes_each_parameter_to_its_location() {
        let request = build(
            "https://domain.tld",
            &every_location(),
            json!({
                "id": 42,
                "dryRun": true,
                "X-Request-Id": "abc",
                "body": {"name": "foo"}
            }),
        )
        .unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.uri().as_str(), "https://domain.tld/things/42?dryRun=true");
        assert_eq!(request.header_line("X-Request-Id"), "abc");
        assert_eq!(request.header_line("Content-Type"), "application/json");
        assert_eq!(request.header_line("Accept"), "application/json");
        assert_eq!(request.body(), Some(r#"{"name":"foo"}"#));
    }

    #[test]
    fn unknown_parameter_fails_before_building() {
        let err = build("https://domain.tld", &every_location(), json!({"nope": 1})).unwrap_err();
        assert!(matches!(
            err,
            ApiServiceError::InvalidParameter { ref name, ref operation_id }
                if name == "nope" && operation_id == "updateThing"
        ));
        assert_eq!(
            err.to_string(),
            "nope is not a defined request parameter for operationId updateThing"
        );
    }

    #[test]
    fn defaults_fill_missing_parameters_only() {
        let definition = RequestDefinition::new("list", "GET", "/things")
            .with_parameter(
                Parameter::new("page", ParameterLocation::Query)
                    .with_schema(json!({"type": "integer", "default": 1})),
            )
            .with_parameter(
                Parameter::new("q", ParameterLocation::Query)
                    .with_schema(json!({"type": "string", "default": "all"})),
            )
            .with_parameter(
                Parameter::new("X-Version", ParameterLocation::Header)
                    .with_schema(json!({"type": "string", "default": "2"})),
            );

        let request = build("https://domain.tld", &definition, json!({})).unwrap();
        assert_eq!(request.uri().query(), Some("page=1&q=all"));
        assert_eq!(request.header_line("X-Version"), "2");

        let request = build(
            "https://domain.tld",
            &definition,
            json!({"page": 0, "q": "", "X-Version": "3"}),
        )
        .unwrap();
        assert_eq!(request.uri().query(), Some("page=0&q="));
        assert_eq!(request.header_line("X-Version"), "3");
    }

    #[test]
    fn body_property_defaults_are_merged_under_supplied_fields() {
        let definition = RequestDefinition::new("create", "POST", "/things").with_parameter(
            Parameter::new("body", ParameterLocation::Body).with_schema(json!({
                "type": "object",
                "properties": {
                    "status": {"type": "string", "default": "draft"},
                    "name": {"type": "string"}
                }
            })),
        );

        let request = build("https://domain.tld", &definition, json!({})).unwrap();
        assert_eq!(request.body(), Some(r#"{"status":"draft"}"#));

        let request = build(
            "https://domain.tld",
            &definition,
            json!({"body": {"name": "foo"}}),
        )
        .unwrap();
        assert_eq!(request.body(), Some(r#"{"status":"draft","name":"foo"}"#));

        let request = build(
            "https://domain.tld",
            &definition,
            json!({"body": {"status": "published"}}),
        )
        .unwrap();
        assert_eq!(request.body(), Some(r#"{"status":"published"}"#));
    }

    #[test]
    fn no_query_parameters_means_no_query() {
        let definition = RequestDefinition::new("list", "GET", "/things")
            .with_parameter(Parameter::new("q", ParameterLocation::Query));

        let request = build("https://domain.tld?stale=1", &definition, json!({})).unwrap();
        assert_eq!(request.uri().query(), None);
        assert_eq!(request.uri().as_str(), "https://domain.tld/things");

        let request = build("https://domain.tld", &definition, json!({"q": ""})).unwrap();
        assert_eq!(request.uri().query(), Some("q="));

        let request = build("https://domain.tld", &definition, json!({"q": null})).unwrap();
        assert_eq!(request.uri().query(), None);
    }

    #[test]
    fn query_arrays_and_objects() {
        let definition = RequestDefinition::new("list", "GET", "/things")
            .with_parameter(Parameter::new("tag", ParameterLocation::Query))
            .with_parameter(Parameter::new("filter", ParameterLocation::Query));
        let request = build(
            "https://domain.tld",
            &definition,
            json!({"tag": ["a b", "c"], "filter": {"name": "x"}}),
        )
        .unwrap();
        assert_eq!(
            request.uri().query(),
            Some("tag=a+b&tag=c&filter%5Bname%5D=x")
        );
    }

    #[test]
    fn base_uri_path_is_kept_as_prefix() {
        let definition = RequestDefinition::new("get", "GET", "/things/{id}")
            .with_parameter(Parameter::new("id", ParameterLocation::Path));
        let request = build("http://domain.tld/api/v1/", &definition, json!({"id": "a/b"})).unwrap();
        assert_eq!(request.uri().as_str(), "http://domain.tld/api/v1/things/a%2Fb");
    }

    #[test]
    fn form_data_is_url_encoded() {
        let definition = RequestDefinition::new("upload", "POST", "/forms")
            .with_content_type("application/x-www-form-urlencoded")
            .with_parameter(Parameter::new("name", ParameterLocation::FormData))
            .with_parameter(Parameter::new("note", ParameterLocation::FormData));
        let request = build(
            "https://domain.tld",
            &definition,
            json!({"name": "foo", "note": "a&b"}),
        )
        .unwrap();
        assert_eq!(request.body(), Some("name=foo&note=a%26b"));
        assert_eq!(
            request.content_type(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn body_and_form_data_conflict() {
        let definition = RequestDefinition::new("mixed", "POST", "/mixed")
            .with_parameter(Parameter::new("name", ParameterLocation::FormData))
            .with_parameter(Parameter::new("body", ParameterLocation::Body));
        let err = build(
            "https://domain.tld",
            &definition,
            json!({"name": "foo", "body": {"a": 1}}),
        )
        .unwrap_err();
        assert!(matches!(err, ApiServiceError::ConflictingBody { .. }));
    }

    #[test]
    fn xml_body_is_encoded_for_xml_content_type() {
        let definition = RequestDefinition::new("create", "POST", "/things")
            .with_content_type("application/xml")
            .with_parameter(Parameter::new("body", ParameterLocation::Body));
        let request = build("https://domain.tld", &definition, json!({"body": {"name": "foo"}})).unwrap();
        assert_eq!(request.header_line("Content-Type"), "application/xml");
        assert_eq!(
            request.body(),
            Some("<?xml version=\"1.0\" encoding=\"UTF-8\"?><response><name>foo</name></response>")
        );
    }

    #[test]
    fn unsupported_body_format_is_reported() {
        let definition = RequestDefinition::new("create", "POST", "/things")
            .with_content_type("text/csv")
            .with_parameter(Parameter::new("body", ParameterLocation::Body));
        let err = build("https://domain.tld", &definition, json!({"body": {"a": 1}})).unwrap_err();
        assert!(matches!(
            err,
            ApiServiceError::Serializer(SerializerError::UnsupportedFormat(ref f)) if f == "csv"
        ));
    }

    #[test]
    fn invalid_method_and_header_are_reported() {
        let definition = RequestDefinition::new("bad", "GE T", "/");
        assert!(matches!(
            build("https://domain.tld", &definition, json!({})).unwrap_err(),
            ApiServiceError::InvalidMethod { .. }
        ));

        let definition = RequestDefinition::new("bad", "GET", "/")
            .with_parameter(Parameter::new("X-Bad", ParameterLocation::Header));
        assert!(matches!(
            build("https://domain.tld", &definition, json!({"X-Bad": "line\nbreak"})).unwrap_err(),
            ApiServiceError::InvalidHeader { .. }
        ));
    }
}
