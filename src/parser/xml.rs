//! Minimal element tree over quick-xml events.
//!
//! GILDA exports nest their records at varying depths, so ingestors search
//! by tag name anywhere below a node instead of binding to a fixed layout.
//! Only elements and attributes are kept; text content is not used by any
//! of the grammars.
//!
//! Input is raw bytes: names and attribute values are decoded with the
//! encoding named in the XML declaration (UTF-8 when there is none).

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::IngestError;

/// Name of the synthetic node returned by [`parse_document`]
pub const DOCUMENT: &str = "#document";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn require_attr(&self, name: &'static str) -> Result<&str, IngestError> {
        self.attr(name).ok_or_else(|| IngestError::MissingAttribute {
            element: self.name.clone(),
            attribute: name,
        })
    }

    /// All elements named `name` below this one, in document order
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect(self, name, &mut found);
        found
    }

    /// First element named `name` below this one
    pub fn first(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.first(name)
            }
        })
    }
}

fn collect<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.name == name {
            found.push(child);
        }
        collect(child, name, found);
    }
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String, IngestError> {
    let text = decoder.decode(bytes).map_err(quick_xml::Error::from)?;
    Ok(text.into_owned())
}

fn element_from(start: &BytesStart<'_>, decoder: Decoder) -> Result<Element, IngestError> {
    let mut element = Element::new(decode(decoder, start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = decode(decoder, attr.key.as_ref())?;
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Parse a document into a tree rooted at a synthetic [`DOCUMENT`] node
pub fn parse_document(input: impl AsRef<[u8]>) -> Result<Element, IngestError> {
    let mut reader = Reader::from_reader(input.as_ref());
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::new(DOCUMENT)];
    let mut buf = Vec::new();

    loop {
        let decoder = reader.decoder();
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => stack.push(element_from(&start, decoder)?),
            Event::Empty(start) => {
                let element = element_from(&start, decoder)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .filter(|_| !stack.is_empty())
                    .ok_or_else(|| IngestError::InvalidDocument("unbalanced end tag".into()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root),
        (Some(open), false) => Err(IngestError::InvalidDocument(format!(
            "element <{}> is never closed",
            open.name
        ))),
        (None, _) => Err(IngestError::InvalidDocument("empty element stack".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_search_any_depth() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <Export>
              <Structures>
                <Structure EngName="ALT">
                  <Field Name="A"/>
                  <Group><Field Name="B"/></Group>
                </Structure>
              </Structures>
            </Export>"#,
        )
        .unwrap();

        assert_eq!(doc.name, DOCUMENT);
        let structures = doc.descendants("Structure");
        assert_eq!(structures.len(), 1);
        assert_eq!(structures[0].attr("EngName"), Some("ALT"));

        let names: Vec<_> = structures[0]
            .descendants("Field")
            .iter()
            .filter_map(|f| f.attr("Name"))
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_attributes_are_unescaped() {
        let doc = parse_document(r#"<Enumerate Definition="A &amp; B"/>"#).unwrap();
        let element = doc.first("Enumerate").unwrap();
        assert_eq!(element.attr("Definition"), Some("A & B"));
        assert!(!element.has_attr("Value"));
    }

    #[test]
    fn test_missing_attribute_names_element() {
        let doc = parse_document(r#"<Field Size="4"/>"#).unwrap();
        let err = doc.first("Field").unwrap().require_attr("Name").unwrap_err();
        assert_eq!(err.to_string(), "<Field> is missing attribute 'Name'");
    }

    #[test]
    fn test_declared_encoding_is_honoured() {
        let mut input = br#"<?xml version="1.0" encoding="ISO-8859-1"?>
            <Field Name="TEMP" Description="Temp"#
            .to_vec();
        input.push(0xE9);
        input.extend_from_slice(br#"rature"/>"#);

        let doc = parse_document(&input).unwrap();
        let field = doc.first("Field").unwrap();
        assert_eq!(field.attr("Description"), Some("Température"));
    }

    #[test]
    fn test_utf8_without_declaration() {
        let doc = parse_document(r#"<Field Description="Température"/>"#).unwrap();
        assert_eq!(
            doc.first("Field").unwrap().attr("Description"),
            Some("Température")
        );
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        assert!(parse_document("<A><B></A>").is_err());
        assert!(parse_document("<A><B/>").is_err());
    }
}
