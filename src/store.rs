//! Document store and resolver.
//!
//! The store owns every [`Identifiable`] of one package, keyed by
//! [`Identifier`], plus the supplementary files embedded next to them.
//! References are resolved by key at the point of use.

use indexmap::IndexMap;

use crate::error::AasxError;
use crate::model::{
    AssetAdministrationShell, IdShortPath, Identifiable, Identifier, Reference, Submodel,
    SubmodelElement,
};

/// A binary attachment of a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplementaryFile {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Supplementary files keyed by absolute part path (`/aasx/files/x.pdf`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileStore {
    files: IndexMap<String, SupplementaryFile>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file. The path is normalized to start with `/`.
    pub fn add(&mut self, path: &str, content_type: impl Into<String>, data: Vec<u8>) -> String {
        let path = normalize_path(path);
        self.files.insert(
            path.clone(),
            SupplementaryFile {
                content_type: content_type.into(),
                data,
            },
        );
        path
    }

    pub fn get(&self, path: &str) -> Option<&SupplementaryFile> {
        self.files.get(normalize_path(path).as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(normalize_path(path).as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SupplementaryFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Package-level data that is not part of the object graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageMeta {
    /// XML namespaces declared by the spec parts that were read.
    pub namespaces: IndexMap<String, String>,
    /// Further `aasenv` root attributes of those parts, first value per key.
    pub root_attributes: Vec<(String, String)>,
    /// Path of the package thumbnail inside the file store.
    pub thumbnail: Option<String>,
    /// Core properties part, carried verbatim.
    pub core_properties: Option<Vec<u8>>,
}

/// All objects and files of one package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentStore {
    objects: IndexMap<Identifier, Identifiable>,
    pub files: FileStore,
    pub meta: PackageMeta,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. Fails if its identifier is already taken.
    pub fn add(&mut self, object: impl Into<Identifiable>) -> Result<(), AasxError> {
        let object = object.into();
        let id = object.identification().clone();
        if self.objects.contains_key(&id) {
            return Err(AasxError::invalid_element(format!(
                "identifier {id} is already present in the store"
            )));
        }
        self.objects.insert(id, object);
        Ok(())
    }

    pub fn get(&self, id: &Identifier) -> Option<&Identifiable> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &Identifier) -> Option<&mut Identifiable> {
        self.objects.get_mut(id)
    }

    /// Look up by identifier string, whatever its scheme.
    pub fn find_by_id(&self, id: &str) -> Option<&Identifiable> {
        self.objects.values().find(|o| o.identification().as_str() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Identifiable> {
        self.objects
            .values_mut()
            .find(|o| o.identification().as_str() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifiable> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn shells(&self) -> impl Iterator<Item = &AssetAdministrationShell> {
        self.objects.values().filter_map(Identifiable::as_shell)
    }

    pub fn submodels(&self) -> impl Iterator<Item = &Submodel> {
        self.objects.values().filter_map(Identifiable::as_submodel)
    }

    /// Submodel by identifier string.
    pub fn submodel(&self, id: &str) -> Result<&Submodel, AasxError> {
        self.find_by_id(id)
            .and_then(Identifiable::as_submodel)
            .ok_or_else(|| AasxError::identifier_not_found(id))
    }

    pub fn submodel_mut(&mut self, id: &str) -> Result<&mut Submodel, AasxError> {
        self.find_by_id_mut(id)
            .and_then(Identifiable::as_submodel_mut)
            .ok_or_else(|| AasxError::identifier_not_found(id))
    }

    /// Top-level object a reference starts from.
    pub fn resolve(&self, reference: &Reference) -> Option<&Identifiable> {
        self.get(&reference.root_identifier()?)
    }

    /// Element a reference points at, following its id_short keys.
    pub fn resolve_element(&self, reference: &Reference) -> Option<&SubmodelElement> {
        let submodel = self.resolve(reference)?.as_submodel()?;
        let segments: Vec<&str> = reference.id_short_path().collect();
        let path = IdShortPath::parse(&segments.join(".")).ok()?;
        submodel.elements.resolve(&path)
    }

    /// Check that every shell reference resolves inside this store.
    pub fn check_references(&self) -> Result<(), AasxError> {
        for shell in self.shells() {
            for reference in std::iter::once(&shell.asset).chain(shell.submodels.iter()) {
                if reference.keys.is_empty() {
                    continue;
                }
                if self.resolve(reference).is_none() {
                    let key = reference
                        .keys
                        .first()
                        .map(|k| k.value.clone())
                        .unwrap_or_default();
                    return Err(AasxError::identifier_not_found(key));
                }
            }
        }
        Ok(())
    }
}
