//! Open Packaging Conventions plumbing: content types, relationships and
//! part name arithmetic.

use indexmap::IndexMap;

use crate::error::AasxError;
use crate::xml::{self, XmlDocument, XmlElement};

/// Well-known part names.
pub mod paths {
    pub const CONTENT_TYPES: &str = "/[Content_Types].xml";
    pub const ROOT_RELS: &str = "/_rels/.rels";
    pub const ORIGIN: &str = "/aasx/aasx-origin";
    pub const CORE_PROPERTIES: &str = "/docProps/core.xml";
}

/// Relationship type URIs.
pub mod rel_types {
    pub const AASX_ORIGIN: &str = "http://www.admin-shell.io/aasx/relationships/aasx-origin";
    pub const AAS_SPEC: &str = "http://www.admin-shell.io/aasx/relationships/aas-spec";
    pub const AAS_SPEC_SPLIT: &str = "http://www.admin-shell.io/aasx/relationships/aas-spec-split";
    pub const AAS_SUPPL: &str = "http://www.admin-shell.io/aasx/relationships/aas-suppl";
    pub const THUMBNAIL: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}

/// Content type strings.
pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "text/xml";
    pub const ORIGIN: &str = "text/plain";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// The `[Content_Types].xml` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// Lowercased extension to content type.
    pub defaults: IndexMap<String, String>,
    /// Part name to content type.
    pub overrides: IndexMap<String, String>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(input: &[u8]) -> Result<Self, AasxError> {
        let document = parse_plumbing(input)?;
        if document.root.local_name() != "Types" {
            return Err(AasxError::corrupt(format!(
                "content types root is <{}>",
                document.root.name
            )));
        }
        let mut types = Self::new();
        for entry in &document.root.children {
            match entry.local_name() {
                "Default" => {
                    if let (Some(ext), Some(ct)) =
                        (entry.attribute("Extension"), entry.attribute("ContentType"))
                    {
                        types.add_default(ext, ct);
                    }
                }
                "Override" => {
                    if let (Some(part), Some(ct)) =
                        (entry.attribute("PartName"), entry.attribute("ContentType"))
                    {
                        types.add_override(&decode_part_name(part), ct);
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    pub fn add_default(&mut self, extension: &str, content_type: impl Into<String>) {
        self.defaults
            .insert(extension.to_ascii_lowercase(), content_type.into());
    }

    /// Override for a part, keyed by its decoded name.
    pub fn add_override(&mut self, part: &str, content_type: impl Into<String>) {
        self.overrides.insert(part.to_string(), content_type.into());
    }

    /// Content type of a part: its override, else the default for its extension.
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct);
        }
        let (_, ext) = file_name(part).rsplit_once('.')?;
        self.defaults
            .get(&ext.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>, AasxError> {
        let mut root = XmlElement::new("Types");
        for (ext, ct) in &self.defaults {
            root.children.push(
                XmlElement::new("Default")
                    .with_attribute("Extension", ext.as_str())
                    .with_attribute("ContentType", ct.as_str()),
            );
        }
        for (part, ct) in &self.overrides {
            root.children.push(
                XmlElement::new("Override")
                    .with_attribute("PartName", encode_part_name(part))
                    .with_attribute("ContentType", ct.as_str()),
            );
        }
        write_with_default_namespace(root, CONTENT_TYPES_NS)
    }
}

/// One entry of a `.rels` part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// All relationships of one source part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relationships {
    pub entries: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(input: &[u8]) -> Result<Self, AasxError> {
        let document = parse_plumbing(input)?;
        if document.root.local_name() != "Relationships" {
            return Err(AasxError::corrupt(format!(
                "relationships root is <{}>",
                document.root.name
            )));
        }
        let entries = document
            .root
            .children_named("Relationship")
            .filter_map(|entry| {
                Some(Relationship {
                    id: entry.attribute("Id").unwrap_or_default().to_string(),
                    rel_type: entry.attribute("Type")?.to_string(),
                    target: entry.attribute("Target")?.to_string(),
                    external: entry.attribute("TargetMode") == Some("External"),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    /// Add an internal relationship with a fresh id.
    pub fn add(&mut self, rel_type: &str, target: impl Into<String>) {
        let id = loop {
            let candidate = format!("R{}", &uuid::Uuid::new_v4().simple().to_string()[..16]);
            if !self.entries.iter().any(|r| r.id == candidate) {
                break candidate;
            }
        };
        self.entries.push(Relationship {
            id,
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        });
    }

    pub fn of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.entries
            .iter()
            .filter(move |r| r.rel_type == rel_type && !r.external)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> Result<Vec<u8>, AasxError> {
        let mut root = XmlElement::new("Relationships");
        for rel in &self.entries {
            let mut node = XmlElement::new("Relationship")
                .with_attribute("Type", rel.rel_type.as_str())
                .with_attribute("Target", rel.target.as_str())
                .with_attribute("Id", rel.id.as_str());
            if rel.external {
                node = node.with_attribute("TargetMode", "External");
            }
            root.children.push(node);
        }
        write_with_default_namespace(root, RELATIONSHIPS_NS)
    }
}

/// Malformed package plumbing means a broken container, not bad model XML.
fn parse_plumbing(input: &[u8]) -> Result<XmlDocument, AasxError> {
    xml::parse_document(input).map_err(|e| e.reclassify_xml(AasxError::corrupt))
}

fn write_with_default_namespace(root: XmlElement, namespace: &str) -> Result<Vec<u8>, AasxError> {
    let mut namespaces = IndexMap::new();
    namespaces.insert(String::new(), namespace.to_string());
    xml::write_document(&XmlDocument { root, namespaces })
}

fn file_name(part: &str) -> &str {
    part.rsplit_once('/').map(|(_, name)| name).unwrap_or(part)
}

/// Relationship part that holds the relationships of `part`.
pub fn rels_part_for(part: &str) -> String {
    if part == "/" || part.is_empty() {
        return paths::ROOT_RELS.to_string();
    }
    let (dir, name) = part.rsplit_once('/').unwrap_or(("", part));
    format!("{dir}/_rels/{name}.rels")
}

/// Absolute part name of a relationship target, relative to its source part.
pub fn resolve_target(source: &str, target: &str) -> String {
    let joined = if target.starts_with('/') {
        target.to_string()
    } else {
        let dir = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        format!("{dir}/{target}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Percent-encode each segment of a part name (`/my model.fmu` becomes
/// `/my%20model.fmu`). Used for zip entries, overrides and relationship targets.
pub fn encode_part_name(part: &str) -> String {
    part.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`encode_part_name`]. Names that do not decode to UTF-8 are kept as is.
pub fn decode_part_name(name: &str) -> String {
    urlencoding::decode(name)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| name.to_string())
}

/// Zip entry name of a part.
pub fn entry_name(part: &str) -> &str {
    part.trim_start_matches('/')
}

/// Part name of a zip entry.
pub fn part_name(entry: &str) -> String {
    format!("/{}", entry.trim_start_matches('/'))
}
