//! Common trait for serializations of AAS spec parts.

use indexmap::IndexMap;

use super::xml::AasXml;
use crate::error::AasxError;
use crate::model::Identifiable;

/// Content of one spec part: a set of identifiables plus the XML namespaces
/// and other root attributes the part declared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    pub objects: Vec<Identifiable>,
    pub namespaces: IndexMap<String, String>,
    /// Root attributes other than namespace declarations (`xsi:schemaLocation`).
    pub attributes: Vec<(String, String)>,
}

/// Trait for spec part serializations.
///
/// Implementations convert between raw part bytes and an [`Environment`].
/// The package reader picks one by content type and extension; parts for
/// which no format is found are rejected rather than skipped.
pub trait PartFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// Content type written for parts of this format.
    fn content_type(&self) -> &'static str;

    /// Read an environment from part bytes.
    fn read(&self, input: &[u8]) -> Result<Environment, AasxError>;

    /// Write an environment to part bytes.
    fn write(&self, environment: &Environment) -> Result<Vec<u8>, AasxError>;

    /// Quick check that the input looks like this format, without a full parse.
    fn validate(&self, input: &[u8]) -> Result<(), AasxError> {
        let _ = input;
        Ok(())
    }
}

/// Pick a format for a spec part from its content type, falling back to the
/// part name's extension.
pub fn detect_format(part: &str, content_type: Option<&str>) -> Option<Box<dyn PartFormat>> {
    if let Some(content_type) = content_type {
        let base = content_type.split(';').next().unwrap_or(content_type).trim();
        match base {
            "text/xml" | "application/xml" | "application/aas+xml" => {
                return Some(Box::new(AasXml));
            }
            "application/json" | "application/aas+json" => return None,
            _ => {}
        }
    }

    let ext = part.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
    if AasXml.extensions().contains(&ext.as_str()) {
        Some(Box::new(AasXml))
    } else {
        None
    }
}
