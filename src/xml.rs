//! Minimal owned XML element tree on top of quick-xml.
//!
//! Package parts are small enough to hold in memory, and keeping every node
//! lets serializers carry children they do not model back out unchanged.

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

use crate::error::AasxError;

/// One XML element with its attributes, child elements and text content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written in the source (`prefix:local` or `local`).
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated text content. Whitespace between child elements is dropped.
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Element holding only text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix, empty for unprefixed names.
    pub fn prefix(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(prefix, _)| prefix)
            .unwrap_or("")
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| local_name(k) == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// Text of the first child with the given local name.
    pub fn child_text(&self, local: &str) -> Option<&str> {
        self.child(local).map(|c| c.text.as_str())
    }
}

/// Strip a namespace prefix from a qualified name.
pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

/// A parsed document: the root element plus the namespaces it declares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
    /// `xmlns` declarations on the root element (prefix → URI, `""` for the default).
    pub namespaces: IndexMap<String, String>,
}

impl XmlDocument {
    /// Namespace URI bound to the root element's prefix.
    pub fn root_namespace(&self) -> Option<&str> {
        self.namespaces
            .get(self.root.prefix())
            .map(String::as_str)
    }
}

/// Parse a complete document into an element tree.
pub fn parse_document(input: &[u8]) -> Result<XmlDocument, AasxError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut namespaces = IndexMap::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            AasxError::xml(format!(
                "XML parse error at position {}: {e}",
                reader.error_position()
            ))
        })?;
        match event {
            Event::Start(ref e) => {
                let element = start_element(e, stack.is_empty() && root.is_none(), &mut namespaces)?;
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let element = start_element(e, stack.is_empty() && root.is_none(), &mut namespaces)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| AasxError::xml("Unbalanced end tag"))?;
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref e) => {
                if let Some(top) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| AasxError::xml(format!("Text error: {e}")))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(AasxError::xml("Unexpected end of document"));
    }
    let root = root.ok_or_else(|| AasxError::xml("Document has no root element"))?;
    Ok(XmlDocument { root, namespaces })
}

fn start_element(
    e: &BytesStart<'_>,
    is_root: bool,
    namespaces: &mut IndexMap<String, String>,
) -> Result<XmlElement, AasxError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| AasxError::xml(format!("Invalid tag name: {e}")))?
        .to_string();
    let mut element = XmlElement::new(name);

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| AasxError::xml(format!("Attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| AasxError::xml(format!("Attribute key error: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| AasxError::xml(format!("Attribute value error: {e}")))?
            .to_string();

        // Root declarations are re-emitted from the namespace table on write
        if is_root {
            if key == "xmlns" {
                namespaces.insert(String::new(), value);
                continue;
            }
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                namespaces.insert(prefix.to_string(), value);
                continue;
            }
        }
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), AasxError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(AasxError::xml("Multiple root elements")),
    }
    Ok(())
}

/// Serialize a document with an XML declaration and two-space indentation.
pub fn write_document(document: &XmlDocument) -> Result<Vec<u8>, AasxError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| AasxError::xml(format!("Write error: {e}")))?;

    let mut root = document.root.clone();
    let mut declarations: Vec<(String, String)> = document
        .namespaces
        .iter()
        .map(|(prefix, uri)| {
            let key = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{prefix}")
            };
            (key, uri.clone())
        })
        .collect();
    declarations.append(&mut root.attributes);
    root.attributes = declarations;

    write_element(&mut writer, &root)?;

    let mut output = buffer.into_inner();
    output.push(b'\n');
    Ok(output)
}

/// Write one element and its subtree.
pub fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> Result<(), AasxError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| AasxError::xml(format!("Write error: {e}")))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| AasxError::xml(format!("Write error: {e}")))?;

    if element.children.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|e| AasxError::xml(format!("Write error: {e}")))?;
    } else {
        for child in &element.children {
            write_element(writer, child)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| AasxError::xml(format!("Write error: {e}")))?;
    Ok(())
}
