use openapi_service::{Meta, RequestDefinition, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct OperationRow {
    #[tabled(rename = "Operation")]
    #[serde(rename = "Operation")]
    operation_id: String,
    #[tabled(rename = "Method")]
    #[serde(rename = "Method")]
    method: String,
    #[tabled(rename = "Path")]
    #[serde(rename = "Path")]
    path: String,
    #[tabled(rename = "Parameters")]
    #[serde(rename = "Parameters")]
    parameters: String,
}

fn build_operation_rows(operations: &[RequestDefinition]) -> Vec<OperationRow> {
    operations
        .iter()
        .map(|op| OperationRow {
            operation_id: op.operation_id.clone(),
            method: op.method.to_uppercase(),
            path: op.path_template.clone(),
            parameters: op
                .parameters
                .iter()
                .map(|p| {
                    let marker = if p.required { "*" } else { "" };
                    format!("{}{} ({})", p.name, marker, p.location.as_str())
                })
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

pub fn print_operations_table(operations: &[RequestDefinition]) {
    println!("{}", Table::new(build_operation_rows(operations)));
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn raw_response_value(response: &Response) -> Value {
    json!({
        "status": response.status().as_u16(),
        "headers": Meta::from_headers(response.headers()).headers,
        "body": response.body(),
    })
}

pub fn print_raw_response(response: &Response) {
    print_json(&raw_response_value(response));
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi_service::{Parameter, ParameterLocation};
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::StatusCode;

    fn operations() -> Vec<RequestDefinition> {
        vec![
            RequestDefinition::new("getPet", "get", "/pets/{id}")
                .with_parameter(Parameter::new("id", ParameterLocation::Path).required())
                .with_parameter(Parameter::new("fields", ParameterLocation::Query)),
            RequestDefinition::new("createPet", "POST", "/pets")
                .with_parameter(Parameter::new("pet", ParameterLocation::Body).required()),
        ]
    }

    #[test]
    fn test_operation_rows() {
        let rows = build_operation_rows(&operations());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].operation_id, "getPet");
        assert_eq!(rows[0].method, "GET");
        assert_eq!(rows[0].path, "/pets/{id}");
        assert_eq!(rows[0].parameters, "id* (path), fields (query)");
        assert_eq!(rows[1].parameters, "pet* (body)");
    }

    #[test]
    fn test_operations_table_headers() {
        let table = Table::new(build_operation_rows(&operations())).to_string();
        let header_line = table.lines().nth(1).unwrap();
        assert!(header_line.contains("Operation"));
        assert!(header_line.contains("Method"));
        assert!(header_line.contains("Path"));
        assert!(header_line.contains("Parameters"));
        assert!(table.contains("createPet"));
    }

    #[test]
    fn test_operation_rows_serializable() {
        let val = serde_json::to_value(build_operation_rows(&operations())).unwrap();
        assert_eq!(val[0]["Operation"], "getPet");
        assert_eq!(val[1]["Method"], "POST");
    }

    #[test]
    fn test_raw_response_value() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = Response::new(StatusCode::NOT_FOUND, headers, "no such pet");

        let val = raw_response_value(&response);
        assert_eq!(val["status"], 404);
        assert_eq!(val["headers"]["content-type"], json!(["text/plain"]));
        assert_eq!(val["body"], "no such pet");
    }
}
