//! XML response decoding (`o=xml`)
//!
//! Bodies are parsed with `quick-xml` into a small owned element tree. The
//! document must have exactly one root element; unbalanced tags, stray text
//! outside the root and unknown entities are reported as
//! [`MmfError::MalformedResponse`]. External entities are never resolved.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{MmfError, Result};

/// One XML element with its attributes, child elements and text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    /// Tag name, including any namespace prefix.
    pub name: String,
    /// Attributes, unescaped.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated text and CDATA content, trimmed.
    pub text: String,
}

impl XmlElement {
    /// Parses a complete XML document and returns its root element.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::response::xml::XmlElement;
    ///
    /// let root = XmlElement::parse(r#"<result><user id="7">Ann</user></result>"#).unwrap();
    /// let user = root.child("user").unwrap();
    /// assert_eq!(user.attribute("id"), Some("7"));
    /// assert_eq!(user.text, "Ann");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = Reader::from_str(input);
        reader.trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                malformed(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    ensure_single_root(&root, &stack)?;
                    stack.push(element_from(&start)?);
                }
                Event::Empty(start) => {
                    ensure_single_root(&root, &stack)?;
                    let element = element_from(&start)?;
                    attach(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("closing tag without opening tag"))?;
                    attach(element, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| malformed(format!("bad text content: {e}")))?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(cdata) => {
                    let raw = cdata.into_inner();
                    push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("element <{}> is never closed", open.name)));
        }
        root.ok_or_else(|| malformed("document has no root element"))
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements named `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Converts to JSON in the usual "XML as object" shape:
    ///
    /// - a leaf element with no attributes becomes its text;
    /// - otherwise an object with `@attr` entries, one entry per child name
    ///   (an array when the name repeats) and `#text` when there is text.
    pub fn to_json(&self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(self.text.clone());
        }

        let mut object = Map::new();
        for (name, value) in &self.attributes {
            object.insert(format!("@{name}"), Value::String(value.clone()));
        }
        for child in &self.children {
            let value = child.to_json();
            // Child values are strings or objects, so an array here is one we built.
            match object.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(child.name.clone(), value);
                }
            }
        }
        if !self.text.is_empty() {
            object.insert("#text".to_string(), Value::String(self.text.clone()));
        }
        Value::Object(object)
    }
}

fn malformed(message: impl std::fmt::Display) -> MmfError {
    MmfError::MalformedResponse(format!("invalid XML {message}"))
}

fn ensure_single_root(root: &Option<XmlElement>, stack: &[XmlElement]) -> Result<()> {
    if root.is_some() && stack.is_empty() {
        return Err(malformed("document has more than one root element"));
    }
    Ok(())
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(format!("bad attribute on <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(format!("bad attribute value on <{name}>: {e}")))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(XmlElement {
        name,
        attributes,
        ..XmlElement::default()
    })
}

/// Attaches a finished element to its parent, or makes it the root.
fn attach(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed("text outside the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_document() {
        let root = XmlElement::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <result>
              <output>
                <route route_id="12" name="Lake &amp; Back"/>
                <route route_id="13" name="Hill"/>
              </output>
              <count>2</count>
            </result>"#,
        )
        .unwrap();

        assert_eq!(root.name, "result");
        let routes: Vec<_> = root.child("output").unwrap().children_named("route").collect();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].attribute("name"), Some("Lake & Back"));
        assert_eq!(root.child("count").unwrap().text, "2");
    }

    #[test]
    fn test_cdata_is_text() {
        let root = XmlElement::parse("<msg><![CDATA[<b>bold</b>]]></msg>").unwrap();
        assert_eq!(root.text, "<b>bold</b>");
    }

    #[test]
    fn test_unclosed_element_is_malformed() {
        let result = XmlElement::parse("<result><count>2</count>");
        assert!(matches!(result, Err(MmfError::MalformedResponse(_))));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let result = XmlElement::parse("<a><b></a></b>");
        assert!(matches!(result, Err(MmfError::MalformedResponse(_))));
    }

    #[test]
    fn test_multiple_roots_are_malformed() {
        let result = XmlElement::parse("<a/><b/>");
        assert!(matches!(result, Err(MmfError::MalformedResponse(_))));
    }

    #[test]
    fn test_empty_and_text_only_documents_are_malformed() {
        for input in ["", "   ", "just text"] {
            assert!(
                matches!(XmlElement::parse(input), Err(MmfError::MalformedResponse(_))),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_to_json_shapes() {
        let root =
            XmlElement::parse(r#"<r v="1"><item>a</item><item>b</item><item>c</item><n>5</n></r>"#)
                .unwrap();
        assert_eq!(
            root.to_json(),
            json!({"@v": "1", "item": ["a", "b", "c"], "n": "5"})
        );
    }
}
