/*
 * attrs.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Attribute extraction for single markup tags.
 */

//! Tag attribute extraction.
//!
//! Parses one markup tag such as `<img src="a.png" width="50">` into its
//! name and an ordered attribute map, and writes the map back out. Parsing
//! is best effort: malformed input yields whatever attributes could be read,
//! possibly none, and never an error.

use hashlink::LinkedHashMap;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Ordered attribute map. Keys are unique and keep their first position.
pub type AttrMap = LinkedHashMap<String, String>;

/// A parsed tag: its name and attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagAttrs {
    pub tag: String,
    pub attrs: AttrMap,
}

impl TagAttrs {
    /// Parse the first tag found in `fragment`.
    pub fn parse(fragment: &str) -> Self {
        let mut reader = Reader::from_str(fragment);
        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) | Ok(Event::Empty(start)) => {
                    let tag = String::from_utf8_lossy(start.name().as_ref()).to_lowercase();
                    let mut attrs = AttrMap::new();
                    let mut iter = start.html_attributes();
                    iter.with_checks(false);
                    for attr in iter {
                        let Ok(attr) = attr else {
                            break;
                        };
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
                        let raw = String::from_utf8_lossy(&attr.value);
                        let value = quick_xml::escape::unescape(&raw)
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| raw.to_string());
                        set_attr(&mut attrs, key, value);
                    }
                    return Self { tag, attrs };
                }
                Ok(Event::Eof) | Err(_) => return Self::default(),
                Ok(_) => continue,
            }
        }
    }

    /// Attributes as `key="value"` pairs separated by spaces.
    pub fn attrs_to_string(&self) -> String {
        attrs_to_string(&self.attrs)
    }

    /// The tag with its current attributes, self-closing.
    pub fn render(&self) -> String {
        format!("<{} {} />", self.tag, self.attrs_to_string())
    }

    /// Move the value of `from` to the end of the map under the name `to`.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.attrs.remove(from) {
            self.attrs.remove(to);
            self.attrs.insert(to.to_string(), value);
        }
    }
}

/// Serialize an attribute map as `key="value"` pairs in map order.
pub fn attrs_to_string(attrs: &AttrMap) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Insert or overwrite without moving an existing key.
fn set_attr(attrs: &mut AttrMap, key: String, value: String) {
    if let Some(existing) = attrs.get_mut(&key) {
        *existing = value;
    } else {
        attrs.insert(key, value);
    }
}
