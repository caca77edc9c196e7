//! URI template expansion (RFC 6570).

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::query::value_to_string;

/// Expands a path template with the routed path parameters.
pub trait UriTemplate: Send + Sync {
    fn expand(&self, template: &str, params: &Map<String, Value>) -> String;
}

/// Characters left alone by simple expansion: ALPHA / DIGIT / `-._~`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters left alone by `+` and `#` expansion: unreserved plus reserved.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'%');

/// RFC 6570 expander covering all level 4 operators and modifiers.
///
/// Undefined variables (missing, `null`, empty list or empty object) are
/// skipped; an expression whose variables are all undefined expands to
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RfcUriTemplate;

struct Operator {
    first: &'static str,
    separator: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

impl Operator {
    fn from_char(c: Option<char>) -> (Self, usize) {
        let (first, separator, named, if_empty, allow_reserved) = match c {
            Some('+') => ("", ",", false, "", true),
            Some('#') => ("#", ",", false, "", true),
            Some('.') => (".", ".", false, "", false),
            Some('/') => ("/", "/", false, "", false),
            Some(';') => (";", ";", true, "", false),
            Some('?') => ("?", "&", true, "=", false),
            Some('&') => ("&", "&", true, "=", false),
            _ => ("", ",", false, "", false),
        };
        let consumed = usize::from(matches!(
            c,
            Some('+' | '#' | '.' | '/' | ';' | '?' | '&')
        ));
        (
            Self {
                first,
                separator,
                named,
                if_empty,
                allow_reserved,
            },
            consumed,
        )
    }

    fn encode(&self, s: &str) -> String {
        let set = if self.allow_reserved {
            RESERVED
        } else {
            UNRESERVED
        };
        utf8_percent_encode(s, set).to_string()
    }
}

struct VarSpec<'a> {
    name: &'a str,
    explode: bool,
    prefix: Option<usize>,
}

impl<'a> VarSpec<'a> {
    fn parse(spec: &'a str) -> Self {
        if let Some(name) = spec.strip_suffix('*') {
            return Self {
                name,
                explode: true,
                prefix: None,
            };
        }
        if let Some((name, len)) = spec.split_once(':') {
            if let Ok(len) = len.parse::<usize>() {
                return Self {
                    name,
                    explode: false,
                    prefix: Some(len),
                };
            }
        }
        Self {
            name: spec,
            explode: false,
            prefix: None,
        }
    }
}

impl RfcUriTemplate {
    fn expand_expression(expression: &str, params: &Map<String, Value>) -> String {
        let (op, consumed) = Operator::from_char(expression.chars().next());
        let mut parts = Vec::new();
        for spec in expression[consumed..].split(',') {
            let var = VarSpec::parse(spec.trim());
            if let Some(part) = Self::expand_var(&op, &var, params.get(var.name)) {
                parts.push(part);
            }
        }
        if parts.is_empty() {
            return String::new();
        }
        format!("{}{}", op.first, parts.join(op.separator))
    }

    fn expand_var(op: &Operator, var: &VarSpec<'_>, value: Option<&Value>) -> Option<String> {
        match value? {
            Value::Null => None,
            Value::Array(items) => {
                let items: Vec<String> = items
                    .iter()
                    .filter_map(value_to_string)
                    .map(|s| op.encode(&s))
                    .collect();
                if items.is_empty() {
                    return None;
                }
                if var.explode {
                    let items: Vec<String> = if op.named {
                        items
                            .into_iter()
                            .map(|s| Self::named(op, var.name, &s))
                            .collect()
                    } else {
                        items
                    };
                    Some(items.join(op.separator))
                } else {
                    Some(Self::named_or_plain(op, var.name, &items.join(",")))
                }
            }
            Value::Object(map) => {
                let pairs: Vec<(String, String)> = map
                    .iter()
                    .filter_map(|(k, v)| value_to_string(v).map(|s| (op.encode(k), op.encode(&s))))
                    .collect();
                if pairs.is_empty() {
                    return None;
                }
                if var.explode {
                    Some(
                        pairs
                            .iter()
                            .map(|(k, v)| format!("{}={}", k, v))
                            .collect::<Vec<_>>()
                            .join(op.separator),
                    )
                } else {
                    let joined = pairs
                        .iter()
                        .map(|(k, v)| format!("{},{}", k, v))
                        .collect::<Vec<_>>()
                        .join(",");
                    Some(Self::named_or_plain(op, var.name, &joined))
                }
            }
            scalar => {
                let mut s = value_to_string(scalar)?;
                if let Some(len) = var.prefix {
                    s = s.chars().take(len).collect();
                }
                Some(Self::named_or_plain(op, var.name, &op.encode(&s)))
            }
        }
    }

    fn named_or_plain(op: &Operator, name: &str, encoded: &str) -> String {
        if op.named {
            Self::named(op, name, encoded)
        } else {
            encoded.to_string()
        }
    }

    fn named(op: &Operator, name: &str, encoded: &str) -> String {
        if encoded.is_empty() {
            format!("{}{}", name, op.if_empty)
        } else {
            format!("{}={}", name, encoded)
        }
    }
}

impl UriTemplate for RfcUriTemplate {
    fn expand(&self, template: &str, params: &Map<String, Value>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let Some(len) = rest[start..].find('}') else {
                // Unterminated expression: keep it literally.
                out.push_str(&rest[start..]);
                return out;
            };
            let expression = &rest[start + 1..start + len];
            out.push_str(&Self::expand_expression(expression, params));
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        out
    }
}
