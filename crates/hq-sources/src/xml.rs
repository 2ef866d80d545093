//! Minimal namespace-agnostic XML tree for report parsing.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, SourceError};

/// An XML element with its local name, attributes, text and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&unescape(&String::from_utf8_lossy(text.as_ref())));
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(data.as_ref()));
                    }
                }
                Event::GeneralRef(reference) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(entity(reference.as_ref()));
                    }
                }
                Event::End(_) => {
                    let Some(mut element) = stack.pop() else {
                        return Err(SourceError::Xml("unbalanced end tag".to_string()));
                    };
                    element.text = element.text.trim().to_string();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Eof => {
                    return Err(SourceError::Xml("document has no root element".to_string()));
                }
                _ => {}
            }
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// All elements named `name` below this one, depth first.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| SourceError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = unescape(&String::from_utf8_lossy(&attr.value));
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn entity(name: &[u8]) -> &'static str {
    match name {
        b"amp" => "&",
        b"lt" => "<",
        b"gt" => ">",
        b"quot" => "\"",
        b"apos" => "'",
        _ => "",
    }
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_without_namespaces() {
        let root = Element::parse(
            r#"<?xml version="1.0"?>
            <a:analysis xmlns:a="urn:x">
              <a:projectInfo><a:reportDate>2017-02-10T15:29:30.600+0000</a:reportDate></a:projectInfo>
              <a:dependencies>
                <a:dependency><a:filePath>lib/x.jar</a:filePath></a:dependency>
                <a:dependency/>
              </a:dependencies>
            </a:analysis>"#,
        )
        .expect("valid xml");
        assert_eq!(root.name, "analysis");
        let date = root
            .child("projectInfo")
            .and_then(|info| info.child("reportDate"))
            .map(|date| date.text.as_str());
        assert_eq!(date, Some("2017-02-10T15:29:30.600+0000"));
        assert_eq!(root.descendants("dependency").len(), 2);
    }

    #[test]
    fn reads_attributes_and_entities() {
        let root = Element::parse(r#"<suite name="a &amp; b">x &lt; y</suite>"#).expect("valid xml");
        assert_eq!(root.attr("name"), Some("a & b"));
        assert_eq!(root.text, "x < y");
        assert!(root.attr("missing").is_none());
    }

    #[test]
    fn rejects_documents_without_root() {
        assert!(Element::parse("").is_err());
    }
}
