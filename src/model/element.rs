//! Referable elements inside a submodel.
//!
//! ```text
//! Submodel
//! └── ElementList
//!     ├── Property
//!     ├── File
//!     ├── Collection (ordered | unordered)
//!     │   └── ElementList ...
//!     └── Opaque (any other element kind, kept as XML)
//! ```

use crate::error::AasxError;
use crate::xml::XmlElement;

/// `kind` of a submodel or submodel element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ModelingKind {
    Template,
    #[default]
    Instance,
}

impl ModelingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "Template",
            Self::Instance => "Instance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Template" | "Type" => Some(Self::Template),
            "Instance" => Some(Self::Instance),
            _ => None,
        }
    }
}

/// Fields shared by every referable element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Referable {
    pub id_short: String,
    pub category: Option<String>,
    pub kind: Option<ModelingKind>,
    /// Children of the element's XML form that are not modelled here
    /// (description, semanticId, qualifier, ...), kept for rewriting.
    pub extras: Vec<XmlElement>,
}

impl Referable {
    pub fn new(id_short: impl Into<String>) -> Self {
        Self {
            id_short: id_short.into(),
            category: None,
            kind: Some(ModelingKind::Instance),
            extras: Vec::new(),
        }
    }
}

/// Scalar value with a declared XSD value type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub referable: Referable,
    pub value_type: String,
    pub value: Option<String>,
}

impl Property {
    /// A `string`-typed property.
    pub fn string(id_short: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            referable: Referable::new(id_short),
            value_type: "string".to_string(),
            value: Some(value.into()),
        }
    }
}

/// Reference to a file, usually a supplementary file inside the package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub referable: Referable,
    pub mime_type: String,
    pub value: Option<String>,
}

impl File {
    pub fn new(
        id_short: impl Into<String>,
        mime_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            referable: Referable::new(id_short),
            mime_type: mime_type.into(),
            value: Some(value.into()),
        }
    }
}

/// Container of child elements.
///
/// Ordered and unordered collections share one type; `ordered` marks whether
/// child position is meaningful.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub referable: Referable,
    pub ordered: bool,
    pub allow_duplicates: bool,
    pub value: ElementList,
}

impl Collection {
    pub fn ordered(id_short: impl Into<String>) -> Self {
        Self {
            referable: Referable::new(id_short),
            ordered: true,
            allow_duplicates: false,
            value: ElementList::new(),
        }
    }

    pub fn unordered(id_short: impl Into<String>) -> Self {
        Self {
            ordered: false,
            ..Self::ordered(id_short)
        }
    }

    /// Builder-style append. Duplicate id_shorts are rejected by [`ElementList::add`].
    pub fn with(mut self, element: impl Into<SubmodelElement>) -> Result<Self, AasxError> {
        self.value.add(element.into())?;
        Ok(self)
    }
}

/// An element kind this crate does not model, carried as its XML form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueElement {
    pub id_short: Option<String>,
    pub node: XmlElement,
}

/// Any element that can appear inside a submodel or collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmodelElement {
    Property(Property),
    File(File),
    Collection(Collection),
    Opaque(OpaqueElement),
}

impl SubmodelElement {
    pub fn id_short(&self) -> Option<&str> {
        match self {
            Self::Property(p) => Some(&p.referable.id_short),
            Self::File(f) => Some(&f.referable.id_short),
            Self::Collection(c) => Some(&c.referable.id_short),
            Self::Opaque(o) => o.id_short.as_deref(),
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Visit every `File` in this subtree.
    pub fn for_each_file<'a>(&'a self, f: &mut impl FnMut(&'a File)) {
        match self {
            Self::File(file) => f(file),
            Self::Collection(c) => c.value.for_each_file(f),
            Self::Property(_) | Self::Opaque(_) => {}
        }
    }

    /// Visit the value of every file reference in this subtree, including
    /// `file` elements nested inside element kinds carried as XML.
    pub fn for_each_file_value<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::File(file) => {
                if let Some(value) = file.value.as_deref() {
                    f(value);
                }
            }
            Self::Collection(c) => c.value.for_each_file_value(f),
            Self::Opaque(opaque) => nested_file_values(&opaque.node, f),
            Self::Property(_) => {}
        }
    }
}

fn nested_file_values<'a>(node: &'a XmlElement, f: &mut impl FnMut(&'a str)) {
    for child in &node.children {
        if child.local_name() == "file" {
            if let Some(value) = child.child_text("value") {
                f(value.trim());
            }
        } else {
            nested_file_values(child, f);
        }
    }
}

impl From<Property> for SubmodelElement {
    fn from(p: Property) -> Self {
        Self::Property(p)
    }
}

impl From<File> for SubmodelElement {
    fn from(f: File) -> Self {
        Self::File(f)
    }
}

impl From<Collection> for SubmodelElement {
    fn from(c: Collection) -> Self {
        Self::Collection(c)
    }
}

/// Children of a submodel or collection, unique by id_short among siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementList {
    elements: Vec<SubmodelElement>,
}

impl ElementList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element. Fails if a sibling already uses its id_short.
    pub fn add(&mut self, element: SubmodelElement) -> Result<(), AasxError> {
        if let Some(id_short) = element.id_short() {
            if self.get(id_short).is_some() {
                return Err(AasxError::invalid_element(format!(
                    "duplicate id_short '{id_short}' among siblings"
                )));
            }
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn get(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.elements
            .iter()
            .find(|e| e.id_short() == Some(id_short))
    }

    pub fn get_mut(&mut self, id_short: &str) -> Option<&mut SubmodelElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id_short() == Some(id_short))
    }

    /// Remove the child with this id_short together with its whole subtree.
    pub fn remove(&mut self, id_short: &str) -> Option<SubmodelElement> {
        let index = self
            .elements
            .iter()
            .position(|e| e.id_short() == Some(id_short))?;
        Some(self.elements.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubmodelElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at a relative id_short path.
    pub fn resolve(&self, path: &IdShortPath) -> Option<&SubmodelElement> {
        let (first, rest) = path.segments.split_first()?;
        let mut current = self.get(first)?;
        for segment in rest {
            current = current.as_collection()?.value.get(segment)?;
        }
        Some(current)
    }

    pub fn resolve_mut(&mut self, path: &IdShortPath) -> Option<&mut SubmodelElement> {
        let (first, rest) = path.segments.split_first()?;
        let mut current = self.get_mut(first)?;
        for segment in rest {
            current = current.as_collection_mut()?.value.get_mut(segment)?;
        }
        Some(current)
    }

    pub fn for_each_file<'a>(&'a self, f: &mut impl FnMut(&'a File)) {
        for element in &self.elements {
            element.for_each_file(f);
        }
    }

    pub fn for_each_file_value<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        for element in &self.elements {
            element.for_each_file_value(f);
        }
    }
}

impl<'a> IntoIterator for &'a ElementList {
    type Item = &'a SubmodelElement;
    type IntoIter = std::slice::Iter<'a, SubmodelElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// A `.`-separated chain of id_shorts relative to a submodel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdShortPath {
    segments: Vec<String>,
}

impl IdShortPath {
    /// Parse `a.b.c`. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self, AasxError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(AasxError::path_not_found(path));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl std::fmt::Display for IdShortPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
