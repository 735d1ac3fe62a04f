//! XML codec.
//!
//! The document tree is written as a `<document>` root. Object members become
//! child elements named after their key; keys that are not usable as XML names
//! are written as `<entry key="...">`. Array elements are written as `<item>`
//! children. Scalars other than strings, and all containers, carry a `type`
//! attribute so that decoding recovers the exact tree:
//!
//! ```xml
//! <document type="object">
//!   <metadata type="object">
//!     <title>Demo</title>
//!     <entry key="last modified">2024-01-01</entry>
//!   </metadata>
//!   <tags type="array">
//!     <item>a</item>
//!     <item type="number">2</item>
//!   </tags>
//! </document>
//! ```
//!
//! Whitespace-only text between elements of a container is layout and is
//! ignored. Text inside a string element is preserved byte for byte.

use std::borrow::Cow;
use std::io::Write;
use std::str::FromStr;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use serde_json::{Map, Number, Value};

use crate::encoding::Encoding;
use crate::error::ConversionError;

const ROOT: &str = "document";
const ITEM: &str = "item";
const ENTRY: &str = "entry";
const BOM: &str = "\u{FEFF}";

/// Declared type of an element, from its `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Number,
    Boolean,
    Null,
    Object,
    Array,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
        }
    }

    fn attribute(self) -> Option<&'static str> {
        match self {
            Self::String => None,
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Null => Some("null"),
            Self::Object => Some("object"),
            Self::Array => Some("array"),
        }
    }

    fn from_attribute(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode(value: &Value) -> Result<Vec<u8>, ConversionError> {
    let mut writer = Writer::new(Vec::new());
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    newline(&mut writer, 0)?;
    write_value(&mut writer, ROOT, None, value, 0)?;
    newline(&mut writer, 0)?;
    Ok(writer.into_inner())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ConversionError> {
    writer
        .write_event(event)
        .map_err(|e| ConversionError::serialize(Encoding::Xml, e))
}

fn newline<W: Write>(writer: &mut Writer<W>, depth: usize) -> Result<(), ConversionError> {
    let layout = format!("\n{}", "  ".repeat(depth));
    emit(writer, Event::Text(BytesText::from_escaped(layout)))
}

fn write_value<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    key: Option<&str>,
    value: &Value,
    depth: usize,
) -> Result<(), ConversionError> {
    let mut start = BytesStart::new(name);
    if let Some(key) = key {
        start.push_attribute(Attribute {
            key: QName(b"key"),
            value: Cow::Owned(escape(key, true)?.into_bytes()),
        });
    }
    if let Some(kind) = Kind::of(value).attribute() {
        start.push_attribute(("type", kind));
    }

    let text = match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(escape(s, false)?),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) => {
            emit(writer, Event::Start(start))?;
            for (k, v) in map {
                newline(writer, depth + 1)?;
                if is_xml_name(k) {
                    write_value(writer, k, None, v, depth + 1)?;
                } else {
                    write_value(writer, ENTRY, Some(k), v, depth + 1)?;
                }
            }
            newline(writer, depth)?;
            return emit(writer, Event::End(BytesEnd::new(name)));
        }
        Value::Array(items) => {
            emit(writer, Event::Start(start))?;
            for item in items {
                newline(writer, depth + 1)?;
                write_value(writer, ITEM, None, item, depth + 1)?;
            }
            newline(writer, depth)?;
            return emit(writer, Event::End(BytesEnd::new(name)));
        }
    };

    match text {
        None => emit(writer, Event::Empty(start)),
        Some(text) => {
            emit(writer, Event::Start(start))?;
            emit(writer, Event::Text(BytesText::from_escaped(text)))?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
    }
}

/// Whether `key` can be written directly as an element name.
fn is_xml_name(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if key.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml")) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Escape character data or an attribute value.
///
/// Carriage returns (and, in attributes, tabs and newlines) are written as
/// character references so that XML line-ending and attribute normalization
/// cannot alter them. Other control characters are not representable in
/// XML 1.0 and are rejected.
fn escape(s: &str, attribute: bool) -> Result<String, ConversionError> {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\t' if attribute => out.push_str("&#9;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\t' | '\n' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                return Err(ConversionError::serialize(
                    Encoding::Xml,
                    format!("character U+{:04X} cannot be represented in XML 1.0", c as u32),
                ));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

enum Content {
    Text(String),
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

struct Frame {
    /// Member key in the parent object, if the parent is an object.
    key: Option<String>,
    kind: Kind,
    content: Content,
}

impl Frame {
    fn finish(self) -> Result<(Option<String>, Value), ConversionError> {
        let value = match (self.kind, self.content) {
            (Kind::String, Content::Text(text)) => Value::String(text),
            (Kind::Number, Content::Text(text)) => Number::from_str(text.trim())
                .map(Value::Number)
                .map_err(|_| parse_err(format!("invalid number {text:?}")))?,
            (Kind::Boolean, Content::Text(text)) => match text.trim() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                other => return Err(parse_err(format!("invalid boolean {other:?}"))),
            },
            (Kind::Null, Content::Text(text)) if text.trim().is_empty() => Value::Null,
            (Kind::Null, Content::Text(text)) => {
                return Err(parse_err(format!("null element has content {text:?}")))
            }
            (_, Content::Object(map)) => Value::Object(map),
            (_, Content::Array(items)) => Value::Array(items),
            (kind, Content::Text(_)) => {
                return Err(parse_err(format!("element of kind {kind:?} has no content model")))
            }
        };
        Ok((self.key, value))
    }
}

fn parse_err(reason: impl ToString) -> ConversionError {
    ConversionError::parse(Encoding::Xml, reason)
}

pub fn decode(bytes: &[u8]) -> Result<Value, ConversionError> {
    let text = std::str::from_utf8(bytes).map_err(parse_err)?;
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_err(format!("{e} at byte {}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => {
                let frame = open(&e, &stack, root.is_some())?;
                stack.push(frame);
            }
            Event::Empty(e) => {
                let frame = open(&e, &stack, root.is_some())?;
                close(frame, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| parse_err("unbalanced closing tag"))?;
                close(frame, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(parse_err)?;
                push_text(&mut stack, &unescaped)?;
            }
            Event::CData(c) => {
                let raw = std::str::from_utf8(&c).map_err(parse_err)?;
                push_text(&mut stack, raw)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry no document content.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(parse_err("unexpected end of input inside an element"));
    }
    root.ok_or_else(|| parse_err("no root element"))
}

fn open(e: &BytesStart<'_>, stack: &[Frame], have_root: bool) -> Result<Frame, ConversionError> {
    let name = String::from_utf8(e.name().as_ref().to_vec()).map_err(parse_err)?;

    let mut kind = Kind::String;
    let mut key_attr: Option<String> = None;
    for attr in e.attributes() {
        let attr = attr.map_err(parse_err)?;
        let value = attr.unescape_value().map_err(parse_err)?;
        match attr.key.as_ref() {
            b"type" => {
                kind = Kind::from_attribute(&value)
                    .ok_or_else(|| parse_err(format!("unknown type {value:?} on <{name}>")))?;
            }
            b"key" => key_attr = Some(value.into_owned()),
            other => {
                return Err(parse_err(format!(
                    "unexpected attribute {:?} on <{name}>",
                    String::from_utf8_lossy(other)
                )))
            }
        }
    }

    let key = match stack.last() {
        None if have_root => return Err(parse_err(format!("second root element <{name}>"))),
        None if name != ROOT => {
            return Err(parse_err(format!("root element must be <{ROOT}>, found <{name}>")))
        }
        None => None,
        Some(parent) => match &parent.content {
            Content::Text(_) => {
                return Err(parse_err(format!("element <{name}> inside a scalar")))
            }
            Content::Array(_) if name != ITEM => {
                return Err(parse_err(format!("array member must be <{ITEM}>, found <{name}>")))
            }
            Content::Array(_) => None,
            Content::Object(_) => match key_attr.take() {
                Some(key) if name == ENTRY => Some(key),
                Some(_) => {
                    return Err(parse_err(format!("key attribute only allowed on <{ENTRY}>")))
                }
                None => Some(name.clone()),
            },
        },
    };
    if key_attr.is_some() {
        return Err(parse_err(format!("unexpected key attribute on <{name}>")));
    }

    let content = match kind {
        Kind::Object => Content::Object(Map::new()),
        Kind::Array => Content::Array(Vec::new()),
        _ => Content::Text(String::new()),
    };
    Ok(Frame { key, kind, content })
}

fn close(
    frame: Frame,
    stack: &mut [Frame],
    root: &mut Option<Value>,
) -> Result<(), ConversionError> {
    let (key, value) = frame.finish()?;
    let Some(parent) = stack.last_mut() else {
        *root = Some(value);
        return Ok(());
    };
    match (&mut parent.content, key) {
        (Content::Object(map), Some(key)) => {
            if map.contains_key(&key) {
                return Err(parse_err(format!("duplicate member {key:?}")));
            }
            map.insert(key, value);
        }
        (Content::Array(items), None) => items.push(value),
        _ => return Err(parse_err("element does not fit its parent")),
    }
    Ok(())
}

fn push_text(stack: &mut [Frame], text: &str) -> Result<(), ConversionError> {
    match stack.last_mut() {
        Some(Frame {
            content: Content::Text(buf),
            ..
        }) => {
            buf.push_str(text);
            Ok(())
        }
        _ if text.trim().is_empty() => Ok(()),
        Some(_) => Err(parse_err(format!("unexpected text {:?} inside a container", text.trim()))),
        None => Err(parse_err(format!("unexpected text {:?} outside the root", text.trim()))),
    }
}
