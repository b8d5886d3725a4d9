//! A minimal owned XML element tree with source line tracking.
//!
//! The loader's second pass revisits construct bodies long after their file
//! was read, so documents are materialised up front instead of streamed.
//! Line numbers come from the reader's byte position against a precomputed
//! table of line starts.

use std::fs;
use std::path::Path;

use log::trace;
use quick_xml::events::attributes::{AttrError, Attribute};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Error;
use crate::vocabulary::{TAG_ATTRIBUTES, TAG_LABEL};

/// One XML element with its attributes, text content and children.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) text: Option<String>,
    pub(crate) children: Vec<Element>,
    /// 1-based source line of the element's tag.
    pub(crate) line: usize,
}

impl Element {
    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Children that are not the label/attributes decorators.
    pub(crate) fn non_meta_children(&self) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|child| child.name != TAG_LABEL && child.name != TAG_ATTRIBUTES)
            .collect()
    }
}

/// Reads and materialises the root element of an XML document.
pub(crate) fn parse_file(path: &Path) -> Result<Element, Error> {
    trace!("reading {}", path.display());
    let content = fs::read_to_string(path)
        .map_err(|err| Error::Io(format!("Cannot read file {}: {err}", path.display())))?;
    parse_str(&content)
}

pub(crate) fn parse_str(content: &str) -> Result<Element, Error> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(content.match_indices('\n').map(|(at, _)| at + 1))
        .collect();
    let line_of = |position: usize| line_starts.partition_point(|&start| start <= position);

    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        let event = reader.read_event().map_err(|err| {
            let line = line_of(reader.buffer_position() as usize);
            Error::Validation(format!("At line {line}, XML error: {err}"))
        })?;
        let line = line_of(reader.buffer_position() as usize);
        match event {
            Event::Start(tag) => stack.push(element_of(tag, line)?),
            Event::Empty(tag) => attach(element_of(tag, line)?, &mut stack, &mut root, line)?,
            Event::End(_) => match stack.pop() {
                Some(element) => attach(element, &mut stack, &mut root, line)?,
                None => {
                    return Err(Error::Validation(format!(
                        "At line {line}, unexpected end tag."
                    )));
                }
            },
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let decoded = reader
                        .decoder()
                        .decode(text.as_ref())
                        .map_err(|err| Error::Validation(format!("At line {line}, {err}")))?;
                    let trimmed = decoded.trim();
                    if !trimmed.is_empty() {
                        parent.text.get_or_insert_with(String::new).push_str(trimmed);
                    }
                }
            }
            Event::CData(_) => {
                return Err(Error::Validation(format!(
                    "At line {line}, CDATA sections are not supported."
                )));
            }
            Event::Eof => break,
            // Comments, declarations, processing instructions and other
            // non-content events carry nothing the model needs.
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(Error::Validation(
            "Open tags have not been closed.".to_string(),
        ));
    }
    root.ok_or_else(|| Error::Validation("Document has no root element.".to_string()))
}

fn element_of(tag: BytesStart<'_>, line: usize) -> Result<Element, Error> {
    let name = decode(tag.name().as_ref(), line)?;
    let mut attributes = Vec::new();
    for attr in tag
        .attributes()
        .collect::<Result<Vec<Attribute>, AttrError>>()
        .map_err(|err| Error::Validation(format!("At line {line}, {err}")))?
    {
        let key = decode(attr.key.as_ref(), line)?;
        let value = String::from_utf8(attr.value.into_owned())
            .map_err(|err| Error::Validation(format!("At line {line}, {err}")))?;
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        text: None,
        children: Vec::new(),
        line,
    })
}

fn decode(bytes: &[u8], line: usize) -> Result<String, Error> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| Error::Validation(format!("At line {line}, {err}")))
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
    line: usize,
) -> Result<(), Error> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "At line {line}, document has more than one root element."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_shape_and_lines() {
        let root = parse_str(
            "<opsa-mef>\n  <define-fault-tree name=\"ft\">\n    <define-gate name=\"top\"/>\n  </define-fault-tree>\n</opsa-mef>\n",
        )
        .expect("well-formed document");
        assert_eq!(root.name, "opsa-mef");
        assert_eq!(root.line, 1);
        let tree = &root.children[0];
        assert_eq!(tree.attribute("name"), Some("ft"));
        assert_eq!(tree.children[0].name, "define-gate");
        assert_eq!(tree.children[0].line, 3);
    }

    #[test]
    fn label_text_and_meta_filtering() {
        let root = parse_str(
            "<define-gate name=\"g\"><label>top gate</label><attributes/><and/></define-gate>",
        )
        .expect("well-formed document");
        let label = root.children_named("label").next().expect("label");
        assert_eq!(label.text.as_deref(), Some("top gate"));
        let body = root.non_meta_children();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].name, "and");
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(parse_str("<a><b></a>").is_err());
        assert!(parse_str("").is_err());
    }
}
