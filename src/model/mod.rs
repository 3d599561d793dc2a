//! In-memory document model of an asset administration package.
//!
//! ## Design
//!
//! Top-level objects ([`Identifiable`]) are owned by a
//! [`DocumentStore`](crate::store::DocumentStore) and point at each other only
//! through key-based [`Reference`]s. Inside a submodel, elements form an owned
//! tree addressed by id_short.
//!
//! ```text
//! DocumentStore
//! ├── Identifier → Asset
//! ├── Identifier → AssetAdministrationShell ──(Reference)──▶ Asset, Submodel*
//! ├── Identifier → Submodel
//! │                └── ElementList (Property | File | Collection | Opaque)
//! └── Identifier → ConceptDescription
//! ```

pub mod element;
pub mod identifiable;
pub mod identifier;
pub mod reference;

pub use element::{
    Collection, ElementList, File, IdShortPath, ModelingKind, OpaqueElement, Property, Referable,
    SubmodelElement,
};
pub use identifiable::{
    Asset, AssetAdministrationShell, AssetKind, ConceptDescription, Identifiable,
    IdentifiableHeader, Submodel,
};
pub use identifier::{Identifier, IdentifierType};
pub use reference::{Key, KeyIdType, KeyType, Reference};
