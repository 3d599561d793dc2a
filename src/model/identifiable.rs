//! Top-level, globally identified objects.

use super::element::{ElementList, ModelingKind};
use super::identifier::Identifier;
use super::reference::{KeyType, Reference};
use crate::xml::XmlElement;

/// Fields shared by every identifiable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifiableHeader {
    pub identification: Identifier,
    pub id_short: Option<String>,
    pub category: Option<String>,
    /// Unmodelled XML children (description, administration, ...).
    pub extras: Vec<XmlElement>,
}

impl IdentifiableHeader {
    pub fn new(identification: Identifier, id_short: Option<String>) -> Self {
        Self {
            identification,
            id_short,
            category: None,
            extras: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AssetKind {
    Type,
    #[default]
    Instance,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Instance => "Instance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Type" => Some(Self::Type),
            "Instance" => Some(Self::Instance),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub header: IdentifiableHeader,
    pub kind: AssetKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetAdministrationShell {
    pub header: IdentifiableHeader,
    pub asset: Reference,
    pub submodels: Vec<Reference>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submodel {
    pub header: IdentifiableHeader,
    pub kind: Option<ModelingKind>,
    pub elements: ElementList,
}

/// Concept descriptions are carried through unchanged; only their header is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConceptDescription {
    pub header: IdentifiableHeader,
}

/// Any top-level object of a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifiable {
    Asset(Asset),
    Shell(AssetAdministrationShell),
    Submodel(Submodel),
    ConceptDescription(ConceptDescription),
}

impl Identifiable {
    pub fn header(&self) -> &IdentifiableHeader {
        match self {
            Self::Asset(a) => &a.header,
            Self::Shell(s) => &s.header,
            Self::Submodel(s) => &s.header,
            Self::ConceptDescription(c) => &c.header,
        }
    }

    pub fn identification(&self) -> &Identifier {
        &self.header().identification
    }

    pub fn id_short(&self) -> Option<&str> {
        self.header().id_short.as_deref()
    }

    /// Key type used when referencing this object.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Asset(_) => KeyType::Asset,
            Self::Shell(_) => KeyType::AssetAdministrationShell,
            Self::Submodel(_) => KeyType::Submodel,
            Self::ConceptDescription(_) => KeyType::ConceptDescription,
        }
    }

    /// Reference pointing at this object.
    pub fn reference(&self) -> Reference {
        Reference::to_identifiable(self.key_type(), self.identification())
    }

    pub fn as_submodel(&self) -> Option<&Submodel> {
        match self {
            Self::Submodel(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_submodel_mut(&mut self) -> Option<&mut Submodel> {
        match self {
            Self::Submodel(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shell(&self) -> Option<&AssetAdministrationShell> {
        match self {
            Self::Shell(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Asset> for Identifiable {
    fn from(a: Asset) -> Self {
        Self::Asset(a)
    }
}

impl From<AssetAdministrationShell> for Identifiable {
    fn from(s: AssetAdministrationShell) -> Self {
        Self::Shell(s)
    }
}

impl From<Submodel> for Identifiable {
    fn from(s: Submodel) -> Self {
        Self::Submodel(s)
    }
}

impl From<ConceptDescription> for Identifiable {
    fn from(c: ConceptDescription) -> Self {
        Self::ConceptDescription(c)
    }
}
