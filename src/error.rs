//! Error types for package operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while extracting, building, reading or writing packages.
#[derive(Debug, Error)]
pub enum AasxError {
    /// Missing or invalid required field in the FMU model description.
    #[error("Malformed model description: {0}")]
    MalformedDescriptor(String),

    /// Archive unreadable or missing required internal structure.
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// Identifier or id_short path does not resolve.
    #[error("Not found: {kind} '{key}'")]
    NotFound { kind: &'static str, key: String },

    /// A part that must be deserialized could not be.
    #[error("Unsupported part {part}: {reason}")]
    UnsupportedPart { part: String, reason: String },

    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Invalid element or structure in the in-memory model.
    #[error("Invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },

    /// Output path rejected before anything was written.
    #[error("Invalid output path: {0}")]
    InvalidOutput(String),

    /// Configuration file could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised while processing a specific file on disk.
    #[error("{}: {source}", path.display())]
    InArchive {
        path: PathBuf,
        #[source]
        source: Box<AasxError>,
    },
}

impl AasxError {
    /// Create a malformed descriptor error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDescriptor(message.into())
    }

    /// Create a corrupt container error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptContainer(message.into())
    }

    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a not-found error for an identifier.
    pub fn identifier_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "identifier",
            key: id.into(),
        }
    }

    /// Create a not-found error for an id_short path.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "id_short path",
            key: path.into(),
        }
    }

    /// Create an unsupported part error.
    pub fn unsupported_part(part: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedPart {
            part: part.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid element error.
    pub fn invalid_element(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "element",
            message: message.into(),
        }
    }

    /// Create an invalid reference error.
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "reference",
            message: message.into(),
        }
    }

    /// Attach the path of the file being processed.
    ///
    /// Errors that already carry a path are returned unchanged.
    pub fn in_archive(self, path: &Path) -> Self {
        match self {
            Self::InArchive { .. } => self,
            other => Self::InArchive {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through any path context.
    pub fn root(&self) -> &AasxError {
        match self {
            Self::InArchive { source, .. } => source.root(),
            other => other,
        }
    }

    /// Re-file a raw XML error under the class appropriate for the caller.
    pub(crate) fn reclassify_xml(self, into: impl FnOnce(String) -> AasxError) -> Self {
        match self {
            Self::Xml(message) => into(message),
            other => other,
        }
    }
}
