//! [`MessageValidator`] backed by the `jsonschema` crate.

use std::borrow::Cow;
use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::Value;
use url::form_urlencoded;

use super::{ConstraintViolation, MessageValidator};
use crate::definition::{ParameterLocation, RequestDefinition};
use crate::message::{Request, Response};
use crate::serializer::{format_from_content_type, same_media_type};

/// Validates parameters and bodies against the JSON schemas declared on the
/// operation.
///
/// String-typed wire values (query, header, path, form fields) are coerced to
/// the schema's declared `type` before validation, so `?page=2` satisfies
/// `{"type": "integer"}`. Bodies are only checked when their media type
/// resolves to the `json` format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl MessageValidator for JsonSchemaValidator {
    fn validate_request(
        &self,
        request: &Request,
        definition: &RequestDefinition,
    ) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();
        let content_type = request.content_type();

        if request.body().is_some()
            && !definition.content_types.is_empty()
            && !definition
                .content_types
                .iter()
                .any(|c| same_media_type(c, &content_type))
        {
            violations.push(media_type_violation(&definition.content_types));
        }

        let query = collect_pairs(request.uri().query_pairs());
        let form = match request.body() {
            Some(body) if format_from_content_type(&content_type) == "x-www-form-urlencoded" => {
                collect_pairs(form_urlencoded::parse(body.as_bytes()))
            }
            _ => BTreeMap::new(),
        };
        let path = path_values(&definition.path_template, request.uri().path());

        for param in &definition.parameters {
            let location = param.location.as_str();
            let instance = match param.location {
                ParameterLocation::Query => query.get(&param.name).map(|raw| coerce(raw, &param.schema)),
                ParameterLocation::FormData => {
                    form.get(&param.name).map(|raw| coerce(raw, &param.schema))
                }
                ParameterLocation::Header => {
                    let raw: Vec<String> = request
                        .headers()
                        .get_all(param.name.as_str())
                        .iter()
                        .filter_map(|v| v.to_str().ok())
                        .map(str::to_string)
                        .collect();
                    (!raw.is_empty()).then(|| coerce(&raw, &param.schema))
                }
                ParameterLocation::Path => match &path {
                    Some(values) => values
                        .get(&param.name)
                        .map(|raw| coerce(std::slice::from_ref(raw), &param.schema)),
                    // The template could not be matched back; nothing to check.
                    None => continue,
                },
                ParameterLocation::Body => match request.body() {
                    None => None,
                    Some(_) if format_from_content_type(&content_type) != "json" => continue,
                    Some(body) => match serde_json::from_str::<Value>(body) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            violations.push(ConstraintViolation::new(
                                param.name.as_str(),
                                format!("Unable to decode the request body: {}", e),
                                "format",
                                location,
                            ));
                            continue;
                        }
                    },
                },
            };

            match instance {
                None if param.required => violations.push(ConstraintViolation::new(
                    param.name.as_str(),
                    format!("The property {} is required", param.name),
                    "required",
                    location,
                )),
                None => {}
                Some(instance) => {
                    validate_value(&param.schema, &instance, &param.name, location, &mut violations)
                }
            }
        }

        violations
    }

    fn validate_response(
        &self,
        response: &Response,
        definition: &RequestDefinition,
    ) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();
        let content_type = response.content_type();

        if !content_type.is_empty()
            && !definition.accepts.is_empty()
            && !definition
                .accepts
                .iter()
                .any(|a| same_media_type(a, &content_type))
        {
            violations.push(media_type_violation(&definition.accepts));
        }

        let response_definition = definition.response_definition(response.status().as_u16());
        let Some(schema) = response_definition.body_schema() else {
            return violations;
        };
        if format_from_content_type(&content_type) != "json" {
            return violations;
        }

        if response.body().trim().is_empty() {
            violations.push(ConstraintViolation::new(
                "body",
                "The response body is empty",
                "required",
                "body",
            ));
            return violations;
        }

        match serde_json::from_str::<Value>(response.body()) {
            Ok(body) => validate_value(schema, &body, "body", "body", &mut violations),
            Err(e) => violations.push(ConstraintViolation::new(
                "body",
                format!("Unable to decode the response body: {}", e),
                "format",
                "body",
            )),
        }

        violations
    }
}

fn media_type_violation(allowed: &[String]) -> ConstraintViolation {
    ConstraintViolation::new(
        "Content-Type",
        format!("Content-Type should be one of [{}]", allowed.join(", ")),
        "enum",
        "header",
    )
}

fn validate_value(
    schema: &Value,
    instance: &Value,
    property: &str,
    location: &str,
    violations: &mut Vec<ConstraintViolation>,
) {
    if schema.as_object().map_or(true, |s| s.is_empty()) {
        return;
    }
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            tracing::warn!("Skipping validation of {}: invalid schema: {}", property, e);
            return;
        }
    };
    for error in validator.iter_errors(instance) {
        let pointer = error.instance_path.to_string();
        let schema_path = error.schema_path.to_string();
        let constraint = schema_path.rsplit('/').next().unwrap_or_default().to_string();
        violations.push(ConstraintViolation::new(
            format!("{}{}", property, pointer),
            error.to_string(),
            constraint,
            location,
        ));
    }
}

fn collect_pairs<'a>(
    pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        map.entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    map
}

/// Converts raw wire strings into a JSON value of the schema's declared type.
fn coerce(raw: &[String], schema: &Value) -> Value {
    let declared = schema.get("type").and_then(Value::as_str);
    if declared == Some("array") {
        let items_schema = schema.get("items").cloned().unwrap_or(Value::Null);
        let items: Vec<&str> = match raw {
            [single] => single.split(',').collect(),
            many => many.iter().map(String::as_str).collect(),
        };
        return Value::Array(
            items
                .into_iter()
                .map(|item| coerce_scalar(item, items_schema.get("type").and_then(Value::as_str)))
                .collect(),
        );
    }
    match raw.first() {
        Some(first) => coerce_scalar(first, declared),
        None => Value::Null,
    }
}

fn coerce_scalar(raw: &str, declared: Option<&str>) -> Value {
    let parsed = match declared {
        Some("integer") => raw.parse::<i64>().ok().map(Value::from),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        Some("boolean") => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Matches a request path back against its template, returning the
/// decoded values of `{var}` and `{+var}` expressions. Returns `None` when
/// the template uses other operators or does not match.
fn path_values(template: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let mut pattern = String::new();
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..start]));
        let len = rest[start..].find('}')?;
        let expression = &rest[start + 1..start + len];
        let (name, group) = match expression.strip_prefix('+') {
            Some(name) => (name, "(.*)"),
            None => (expression, "([^/]*)"),
        };
        if name.is_empty()
            || name.contains([',', '*', ':'])
            || name.starts_with(['#', '.', '/', ';', '?', '&'])
        {
            return None;
        }
        names.push(name.to_string());
        pattern.push_str(group);
        rest = &rest[start + len + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(path)?;
    Some(
        names
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let m = captures.get(i + 1)?;
                if m.as_str().is_empty() {
                    return None;
                }
                Some((name, percent_decode_str(m.as_str()).decode_utf8_lossy().into_owned()))
            })
            .collect(),
    )
}
