//! Pagination extraction strategies.
//!
//! A [`PaginationProvider`] is consulted for every response whose schema root
//! type is `array`. It first says whether it recognises the response, and only
//! then extracts the [`Pagination`] together with the unwrapped entries.

mod hal;
mod hateoas;
mod header;
mod rfc5988;

pub use self::hal::{HalPaginationConfig, HalProvider};
pub use self::hateoas::{HateoasPagination, HateoasPaginationConfig};
pub use self::header::{HeaderPagination, HeaderPaginationConfig};
pub use self::rfc5988::JsonRfc5988Pagination;

use regex::Regex;
use serde_json::Value;

use crate::definition::ResponseDefinition;
use crate::message::Response;
use crate::types::{Pagination, PaginationLinks};

pub trait PaginationProvider: Send + Sync {
    /// Whether this provider can extract pagination from the response.
    /// Must not have side effects.
    fn support_pagination(
        &self,
        data: &Value,
        response: &Response,
        definition: &ResponseDefinition,
    ) -> bool;

    /// Extracts the pagination and returns it with the data stripped of its
    /// pagination envelope. Only called after `support_pagination` said yes.
    fn get_pagination(
        &self,
        data: Value,
        response: &Response,
        definition: &ResponseDefinition,
    ) -> (Pagination, Value);
}

/// Parses RFC 5988 `Link` header values into navigation links.
///
/// Each value may hold several comma-separated `<url>; rel="name"` entries.
/// Only `first`, `last`, `next` and `prev` are kept. Returns `None` when no
/// value was given at all.
pub(crate) fn parse_link_header(values: &[&str]) -> Option<PaginationLinks> {
    if values.is_empty() {
        return None;
    }
    let rel = match Regex::new(r#"rel="?([^";]+)"?"#) {
        Ok(re) => re,
        Err(e) => {
            tracing::error!("Failed to compile link rel regex: {}", e);
            return None;
        }
    };

    let mut links = PaginationLinks::new("", "", None, None);
    for entry in values.iter().flat_map(|v| v.split(',')) {
        let Some(captures) = rel.captures(entry) else {
            continue;
        };
        let url = entry
            .split(';')
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| c == ' ' || c == '<' || c == '>')
            .to_string();
        match captures[1].trim() {
            "first" => links.first = url,
            "last" => links.last = url,
            "next" => links.next = Some(url),
            "prev" => links.prev = Some(url),
            _ => {}
        }
    }
    Some(links)
}

/// Parses the leading integer of a string (`"12abc"` gives 12, `"abc"` gives 0).
pub(crate) fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map_or(0, |n| sign * n)
}

/// Integer reading of a decoded JSON value. Non-numeric values give 0.
pub(crate) fn as_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => leading_int(s),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

/// `ceil(total_items / per_page)`, or 0 when `per_page` is not positive.
pub(crate) fn total_pages(total_items: i64, per_page: i64) -> i64 {
    if per_page <= 0 {
        return 0;
    }
    (total_items + per_page - 1).div_euclid(per_page)
}
