//! Generic XML to JSON tree conversion.

use super::attribute_pairs;
use crate::Result;
use crate::error::TransformError;
use either::{Either, Left, Right};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

/// An element still open.
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(element: &BytesStart<'_>) -> Result<Self> {
        let mut children = Map::new();
        for (name, value) in attribute_pairs(element)? {
            children.insert(format!("@{}", name), Value::String(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
            children,
            text: String::new(),
        })
    }

    /// Bare text for leaf elements, an object otherwise.
    fn content(self) -> Either<String, Map<String, Value>> {
        if self.children.is_empty() {
            return Left(self.text);
        }
        let mut children = self.children;
        if !self.text.is_empty() {
            children.insert("#text".to_string(), Value::String(self.text));
        }
        Right(children)
    }

    fn close(self) -> (String, Value) {
        let name = self.name.clone();
        let value = self.content().either(
            |text| if text.is_empty() { Value::Null } else { Value::String(text) },
            Value::Object,
        );
        (name, value)
    }
}

/// Adds a child, turning repeated names into arrays.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

pub(super) fn convert(content: &str) -> Result<Value> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut root = Map::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => stack.push(Frame::open(e)?),
            Event::Empty(ref e) => {
                let (name, value) = Frame::open(e)?.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Text(ref e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(TransformError::Xml("unbalanced end tag".to_string()));
                };
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    if let Some(frame) = stack.last() {
        return Err(TransformError::Xml(format!(
            "unexpected end of input inside <{}>",
            frame.name
        )));
    }
    if root.is_empty() {
        return Err(TransformError::Xml("no root element".to_string()));
    }
    Ok(Value::Object(root))
}
