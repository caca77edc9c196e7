//! Body encoding and decoding.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::errors::SerializerError;

/// Root element of encoded XML documents.
const XML_ROOT: &str = "response";
/// Element name for entries of a list that has no key of its own.
const XML_ITEM: &str = "item";

/// Encodes request bodies and decodes response bodies for a given format
/// (`json`, `xml`, ...), as derived by [`format_from_content_type`].
pub trait Serializer: Send + Sync {
    fn serialize(&self, data: &Value, format: &str) -> Result<String, SerializerError>;

    fn deserialize(&self, body: &str, format: &str) -> Result<Value, SerializerError>;
}

/// `serde_json`-backed serializer. Only the `json` format is supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, data: &Value, format: &str) -> Result<String, SerializerError> {
        if format != "json" {
            return Err(SerializerError::UnsupportedFormat(format.to_string()));
        }
        serde_json::to_string(data).map_err(|e| SerializerError::Encode(e.to_string()))
    }

    fn deserialize(&self, body: &str, format: &str) -> Result<Value, SerializerError> {
        if format != "json" {
            return Err(SerializerError::UnsupportedFormat(format.to_string()));
        }
        serde_json::from_str(body).map_err(|e| SerializerError::Decode(e.to_string()))
    }
}

/// `quick-xml`-backed serializer for the `xml` format.
///
/// Documents are wrapped in a `<response>` root. Object keys become child
/// elements, keys starting with `@` become attributes and a `#` key holds the
/// element text. A list repeats its key once per entry; a list with no key
/// of its own (top level, or nested in another list) uses `<item>` elements.
///
/// Decoding drops the root element. Text is kept as strings, repeated
/// sibling elements become a list and an empty element decodes to `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl Serializer for XmlSerializer {
    fn serialize(&self, data: &Value, format: &str) -> Result<String, SerializerError> {
        if format != "xml" {
            return Err(SerializerError::UnsupportedFormat(format.to_string()));
        }
        encode_xml(data)
    }

    fn deserialize(&self, body: &str, format: &str) -> Result<Value, SerializerError> {
        if format != "xml" {
            return Err(SerializerError::UnsupportedFormat(format.to_string()));
        }
        decode_xml(body)
    }
}

/// Dispatches on the format: `json` to [`JsonSerializer`], `xml` to
/// [`XmlSerializer`]. This is the service default.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatSerializer;

impl Serializer for FormatSerializer {
    fn serialize(&self, data: &Value, format: &str) -> Result<String, SerializerError> {
        match format {
            "xml" => XmlSerializer.serialize(data, format),
            _ => JsonSerializer.serialize(data, format),
        }
    }

    fn deserialize(&self, body: &str, format: &str) -> Result<Value, SerializerError> {
        match format {
            "xml" => XmlSerializer.deserialize(body, format),
            _ => JsonSerializer.deserialize(body, format),
        }
    }
}

fn encode_xml(data: &Value) -> Result<String, SerializerError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_document(&mut writer, data).map_err(|e| SerializerError::Encode(e.to_string()))?;
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| SerializerError::Encode(e.to_string()))
}

fn write_document<W: std::io::Write>(
    writer: &mut Writer<W>,
    data: &Value,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    match data {
        Value::Array(items) => {
            writer.write_event(Event::Start(BytesStart::new(XML_ROOT)))?;
            write_list(writer, XML_ITEM, items)?;
            writer.write_event(Event::End(BytesEnd::new(XML_ROOT)))?;
            Ok(())
        }
        other => write_value(writer, XML_ROOT, other),
    }
}

fn write_list<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    items: &[Value],
) -> Result<(), quick_xml::Error> {
    for item in items {
        if let Value::Array(inner) = item {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            write_list(writer, XML_ITEM, inner)?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        } else {
            write_value(writer, tag, item)?;
        }
    }
    Ok(())
}

fn write_value<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &Value,
) -> Result<(), quick_xml::Error> {
    match value {
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        Value::Array(items) => write_list(writer, tag, items)?,
        Value::Object(map) => {
            let mut start = BytesStart::new(tag);
            let mut text = None;
            let mut children = Vec::new();
            for (key, item) in map {
                if let Some(attribute) = key.strip_prefix('@') {
                    let rendered = scalar_text(item);
                    start.push_attribute((attribute, rendered.as_str()));
                } else if key == "#" {
                    text = Some(scalar_text(item));
                } else {
                    children.push((key, item));
                }
            }
            if text.is_none() && children.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }
            writer.write_event(Event::Start(start))?;
            if let Some(text) = &text {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            for (key, item) in children {
                write_value(writer, key, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        scalar => {
            let text = scalar_text(scalar);
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct XmlNode {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl XmlNode {
    fn open(start: &BytesStart<'_>) -> Result<Self, SerializerError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(decode_error)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(decode_error)?;
            fields.insert(format!("@{}", key), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut fields = self.fields;
            if !text.is_empty() {
                fields.insert("#".to_string(), Value::String(text.to_string()));
            }
            Value::Object(fields)
        };
        (self.name, value)
    }

    fn adopt(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }
}

fn decode_error(e: impl std::fmt::Display) -> SerializerError {
    SerializerError::Decode(e.to_string())
}

fn decode_xml(body: &str) -> Result<Value, SerializerError> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root = None;

    loop {
        let event = reader.read_event().map_err(decode_error)?;
        let closed = match event {
            Event::Start(start) => {
                stack.push(XmlNode::open(&start)?);
                None
            }
            Event::Empty(start) => Some(XmlNode::open(&start)?.close()),
            Event::End(_) => stack.pop().map(XmlNode::close),
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape().map_err(decode_error)?);
                }
                None
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data));
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some((name, value)) = closed {
            match stack.last_mut() {
                Some(parent) => parent.adopt(name, value),
                None if root.is_none() => root = Some(value),
                None => return Err(SerializerError::Decode("multiple root elements".to_string())),
            }
        }
    }

    if !stack.is_empty() {
        return Err(SerializerError::Decode("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| SerializerError::Decode("no root element".to_string()))
}

/// Extracts the serializer format from a media type.
///
/// `application/json; charset=utf-8` gives `json`, and so does
/// `application/vnd.api+json`.
pub fn format_from_content_type(content_type: &str) -> &str {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    let subtype = media_type
        .split_once('/')
        .map_or(media_type, |(_, subtype)| subtype);
    subtype
        .rsplit_once('+')
        .map_or(subtype, |(_, suffix)| suffix)
}

/// Compares two media types, ignoring parameters and case.
pub(crate) fn same_media_type(a: &str, b: &str) -> bool {
    let essence = |s: &str| s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence(a) == essence(b)
}
