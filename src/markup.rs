//! Minimal element tree over `quick-xml`, shared by the GPX, KML and TCX codecs.
//!
//! Documents are small enough to hold in memory, and a tree keeps the
//! per-format lookups (`trk > name`, `Trackpoint > Position`) readable.
//! Element and attribute names are stored without their namespace prefix.

use std::borrow::Cow;

use chrono::DateTime;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DecodeError;
use crate::Timestamp;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text content, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All descendants called `name`, in document order. Matches are not
    /// searched further.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_descendants(self, name, &mut found);
        found
    }

    /// First descendant called `name`, depth-first.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|c| {
            if c.name == name {
                Some(c)
            } else {
                c.find(name)
            }
        })
    }

    /// Non-empty trimmed text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text).filter(|t| !t.is_empty())
    }

    pub fn child_f64(&self, name: &str) -> Option<f64> {
        self.child_text(name).and_then(parse_f64)
    }
}

fn collect_descendants<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.name == name {
            found.push(child);
        } else {
            collect_descendants(child, name, found);
        }
    }
}

fn malformed(err: impl std::fmt::Display) -> DecodeError {
    DecodeError::Malformed(err.to_string())
}

fn start_element(start: &BytesStart) -> Result<Element, DecodeError> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(malformed)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(DecodeError::Malformed("more than one root element".to_string())),
    }
    Ok(())
}

/// Parse a whole document into its root element.
///
/// Any parser error, mismatched end tag or element left open at the end of
/// input fails the whole document.
pub fn parse_document(content: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(start_element(&e)?),
            Ok(Event::Empty(e)) => {
                let element = start_element(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DecodeError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape().map_err(malformed)?);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DecodeError::Malformed(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::Malformed(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }
    root.ok_or_else(|| DecodeError::Malformed("document has no root element".to_string()))
}

pub fn parse_f64(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Parse an RFC 3339 timestamp, keeping its original offset.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(text.trim()).ok()
}

/// Escape `& < > " '` for element text and attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}
