use openapi_service::pagination::{HalProvider, PaginationProvider};
use openapi_service::{Response, ResponseDefinition};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

fn load_fixture(name: &str) -> Value {
    let body = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
    serde_json::from_str(&body).unwrap()
}

struct Expected {
    page: i64,
    per_page: i64,
    total_items: i64,
    total_pages: i64,
    first: &'static str,
    last: &'static str,
    next: Option<&'static str>,
    prev: Option<&'static str>,
    entries: usize,
}

fn assert_fixture(name: &str, expected: Expected) {
    let data = load_fixture(name);
    let response = Response::new(StatusCode::OK, HeaderMap::new(), "");
    let definition = ResponseDefinition::default();
    let provider = HalProvider::default();

    assert!(provider.support_pagination(&data, &response, &definition), "{name}");
    let (pagination, data) = provider.get_pagination(data, &response, &definition);

    assert_eq!(pagination.page, expected.page, "{name}");
    assert_eq!(pagination.per_page, expected.per_page, "{name}");
    assert_eq!(pagination.total_items, expected.total_items, "{name}");
    assert_eq!(pagination.total_pages, expected.total_pages, "{name}");

    let links = pagination.links.expect("HAL pagination always has links");
    assert_eq!(links.first, expected.first, "{name}");
    assert_eq!(links.last, expected.last, "{name}");
    assert_eq!(links.next.as_deref(), expected.next, "{name}");
    assert_eq!(links.prev.as_deref(), expected.prev, "{name}");

    let entries = data.as_array().unwrap();
    assert_eq!(entries.len(), expected.entries, "{name}");
    for entry in entries {
        let keys: Vec<&str> = entry.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["category", "nickName", "slug", "score", "dateCreated", "dateModified"],
            "{name}"
        );
        let category = entry["category"].as_object().unwrap();
        assert!(!category.contains_key("_links"), "{name}");
        assert!(!category.contains_key("_embedded"), "{name}");
    }
}

#[test]
fn single_page_uses_self_link() {
    assert_fixture(
        "pagination_with_embed_self_page.json",
        Expected {
            page: 1,
            per_page: 2,
            total_items: 2,
            total_pages: 1,
            first: "/videos",
            last: "/videos",
            next: None,
            prev: None,
            entries: 2,
        },
    );
}

#[test]
fn first_page() {
    assert_fixture(
        "pagination_with_embed_first_page.json",
        Expected {
            page: 1,
            per_page: 2,
            total_items: 4,
            total_pages: 2,
            first: "/videos?page=1",
            last: "/videos?page=2",
            next: Some("/videos?page=2"),
            prev: None,
            entries: 2,
        },
    );
}

#[test]
fn second_page() {
    assert_fixture(
        "pagination_with_embed_second_page.json",
        Expected {
            page: 2,
            per_page: 2,
            total_items: 4,
            total_pages: 2,
            first: "/videos?page=1",
            last: "/videos?page=2",
            next: None,
            prev: Some("/videos?page=1"),
            entries: 2,
        },
    );
}

#[test]
fn total_pages_is_computed_not_read() {
    assert_fixture(
        "pagination_with_embed_last_page.json",
        Expected {
            page: 2,
            per_page: 3,
            total_items: 10,
            total_pages: 4,
            first: "/videos?page=1",
            last: "/videos?page=4",
            next: Some("/videos?page=3"),
            prev: Some("/videos?page=1"),
            entries: 3,
        },
    );
}
