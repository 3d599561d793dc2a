//! Global identifiers of top-level objects.

use std::sync::Arc;

/// Scheme of an [`Identifier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum IdentifierType {
    #[default]
    Iri,
    Irdi,
    Custom,
}

impl IdentifierType {
    /// Attribute value used in the package XML.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iri => "IRI",
            Self::Irdi => "IRDI",
            Self::Custom => "Custom",
        }
    }

    /// Parse an `idType` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "IRI" | "URI" => Some(Self::Iri),
            "IRDI" => Some(Self::Irdi),
            "Custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Unique identifier of an Identifiable within a document store.
///
/// Corresponds to `<identification idType="...">` in the package XML.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub id: Arc<str>,
    pub id_type: IdentifierType,
}

impl Identifier {
    pub fn new(id: impl Into<Arc<str>>, id_type: IdentifierType) -> Self {
        Self {
            id: id.into(),
            id_type,
        }
    }

    /// IRI identifier, the scheme used for everything this crate creates.
    pub fn iri(id: impl Into<Arc<str>>) -> Self {
        Self::new(id, IdentifierType::Iri)
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.id_type.as_str())
    }
}
