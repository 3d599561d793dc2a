//! Key-based references between objects.
//!
//! A reference never points at memory: it is a list of keys that is resolved
//! against a [`DocumentStore`](crate::store::DocumentStore) at each use site.

use super::identifier::{Identifier, IdentifierType};

/// The kind of object a [`Key`] designates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    Asset,
    AssetAdministrationShell,
    Submodel,
    ConceptDescription,
    SubmodelElementCollection,
    Property,
    File,
    GlobalReference,
    /// Any other key type, kept verbatim.
    Other(String),
}

impl KeyType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Asset => "Asset",
            Self::AssetAdministrationShell => "AssetAdministrationShell",
            Self::Submodel => "Submodel",
            Self::ConceptDescription => "ConceptDescription",
            Self::SubmodelElementCollection => "SubmodelElementCollection",
            Self::Property => "Property",
            Self::File => "File",
            Self::GlobalReference => "GlobalReference",
            Self::Other(s) => s,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "Asset" => Self::Asset,
            "AssetAdministrationShell" => Self::AssetAdministrationShell,
            "Submodel" => Self::Submodel,
            "ConceptDescription" => Self::ConceptDescription,
            "SubmodelElementCollection" => Self::SubmodelElementCollection,
            "Property" => Self::Property,
            "File" => Self::File,
            "GlobalReference" => Self::GlobalReference,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true if keys of this type name a top-level object.
    pub fn is_identifiable(&self) -> bool {
        matches!(
            self,
            Self::Asset | Self::AssetAdministrationShell | Self::Submodel | Self::ConceptDescription
        )
    }
}

/// How the value of a [`Key`] is to be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyIdType {
    Identifier(IdentifierType),
    IdShort,
    FragmentId,
}

impl KeyIdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier(ty) => ty.as_str(),
            Self::IdShort => "IdShort",
            Self::FragmentId => "FragmentId",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "IdShort" => Some(Self::IdShort),
            "FragmentId" => Some(Self::FragmentId),
            other => IdentifierType::parse(other).map(Self::Identifier),
        }
    }
}

/// One step of a [`Reference`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    pub key_type: KeyType,
    pub local: bool,
    pub id_type: KeyIdType,
    pub value: String,
}

impl Key {
    /// Key addressing a top-level object inside the same package.
    pub fn identifiable(key_type: KeyType, id: &Identifier) -> Self {
        Self {
            key_type,
            local: true,
            id_type: KeyIdType::Identifier(id.id_type),
            value: id.as_str().to_string(),
        }
    }

    /// Key addressing a child element by id_short.
    pub fn id_short(key_type: KeyType, id_short: impl Into<String>) -> Self {
        Self {
            key_type,
            local: true,
            id_type: KeyIdType::IdShort,
            value: id_short.into(),
        }
    }

    /// Identifier this key names, if it names a top-level object.
    pub fn as_identifier(&self) -> Option<Identifier> {
        match self.id_type {
            KeyIdType::Identifier(ty) if self.key_type.is_identifiable() => {
                Some(Identifier::new(self.value.as_str(), ty))
            }
            _ => None,
        }
    }
}

/// An ordered chain of keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reference {
    pub keys: Vec<Key>,
}

impl Reference {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// Reference to a top-level object.
    pub fn to_identifiable(key_type: KeyType, id: &Identifier) -> Self {
        Self::new(vec![Key::identifiable(key_type, id)])
    }

    /// Identifier of the top-level object this reference starts from.
    pub fn root_identifier(&self) -> Option<Identifier> {
        self.keys.first().and_then(Key::as_identifier)
    }

    /// The id_short steps following the root identifier.
    pub fn id_short_path(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .skip(1)
            .filter(|k| k.id_type == KeyIdType::IdShort)
            .map(|k| k.value.as_str())
    }
}
