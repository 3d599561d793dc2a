//! AAS XML (metamodel v2.0) spec part serialization.
//!
//! ## Structure
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <aas:aasenv xmlns:aas="http://www.admin-shell.io/aas/2/0" ...>
//!   <aas:assetAdministrationShells>
//!     <aas:assetAdministrationShell>
//!       <aas:idShort>Pump</aas:idShort>
//!       <aas:identification idType="IRI">https://example.com/aas/Pump</aas:identification>
//!       <aas:assetRef><aas:keys><aas:key type="Asset" local="true" idType="IRI">...</aas:key></aas:keys></aas:assetRef>
//!       <aas:submodelRefs>...</aas:submodelRefs>
//!     </aas:assetAdministrationShell>
//!   </aas:assetAdministrationShells>
//!   <aas:assets>...</aas:assets>
//!   <aas:submodels>...</aas:submodels>
//!   <aas:conceptDescriptions>...</aas:conceptDescriptions>
//! </aas:aasenv>
//! ```
//!
//! Children that the model does not cover are kept on the owning node and
//! written back in schema order, so objects that pass through unchanged keep
//! their full content.

use indexmap::IndexMap;

use super::format::{Environment, PartFormat};
use crate::error::AasxError;
use crate::model::{
    Asset, AssetAdministrationShell, AssetKind, Collection, ConceptDescription, ElementList, File,
    Identifiable, IdentifiableHeader, Identifier, IdentifierType, Key, KeyIdType, KeyType,
    ModelingKind, OpaqueElement, Property, Referable, Reference, Submodel, SubmodelElement,
};
use crate::xml::{self, XmlDocument, XmlElement};

/// Namespace URIs written into every spec part.
pub mod namespace {
    /// AAS metamodel v2.0.
    pub const AAS: &str = "http://www.admin-shell.io/aas/2/0";
    /// IEC 61360 data specification template v2.0.
    pub const IEC: &str = "http://www.admin-shell.io/IEC61360/2/0";
    /// Attribute based access control v2.0.
    pub const ABAC: &str = "http://www.admin-shell.io/aas/abac/2/0";
    /// XML schema instance.
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
}

/// AAS XML format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct AasXml;

impl PartFormat for AasXml {
    fn name(&self) -> &'static str {
        "AAS XML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn content_type(&self) -> &'static str {
        "text/xml"
    }

    fn read(&self, input: &[u8]) -> Result<Environment, AasxError> {
        reader::read_environment(input)
    }

    fn write(&self, environment: &Environment) -> Result<Vec<u8>, AasxError> {
        writer::write_environment(environment)
    }

    fn validate(&self, input: &[u8]) -> Result<(), AasxError> {
        let content = String::from_utf8_lossy(input);
        if !content.contains("aasenv") {
            return Err(AasxError::xml("Missing aasenv root element"));
        }
        Ok(())
    }
}

/// Child sequences of the v2.0 schema types, by local name.
mod order {
    pub const SHELL: &[&str] = &[
        "idShort", "category", "description", "parent",
        "identification", "administration", "embeddedDataSpecification", "derivedFrom",
        "assetRef", "submodelRefs", "views", "conceptDictionaries", "security",
    ];
    pub const ASSET: &[&str] = &[
        "idShort", "category", "description", "parent",
        "identification", "administration", "embeddedDataSpecification",
        "assetIdentificationModelRef", "billOfMaterialRef", "kind",
    ];
    pub const SUBMODEL: &[&str] = &[
        "idShort", "category", "description", "parent",
        "identification", "administration", "kind", "semanticId", "qualifier",
        "embeddedDataSpecification", "submodelElements",
    ];
    pub const CONCEPT_DESCRIPTION: &[&str] = &[
        "idShort", "category", "description", "parent",
        "identification", "administration", "embeddedDataSpecification", "isCaseOf",
    ];
    pub const PROPERTY: &[&str] = &[
        "idShort", "category", "description", "parent",
        "kind", "semanticId", "qualifier", "embeddedDataSpecification",
        "valueType", "value", "valueId",
    ];
    pub const FILE: &[&str] = &[
        "idShort", "category", "description", "parent",
        "kind", "semanticId", "qualifier", "embeddedDataSpecification",
        "mimeType", "value",
    ];
    pub const COLLECTION: &[&str] = &[
        "idShort", "category", "description", "parent",
        "kind", "semanticId", "qualifier", "embeddedDataSpecification",
        "ordered", "allowDuplicates", "value",
    ];
}

/// Stable sort of children into schema order. Unknown names go last,
/// keeping their relative order.
fn sort_schema(children: &mut [XmlElement], order: &[&str]) {
    children.sort_by_key(|child| {
        order
            .iter()
            .position(|name| *name == child.local_name())
            .unwrap_or(order.len())
    });
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

// ============================================================================
// READER
// ============================================================================

mod reader {
    use super::*;

    pub fn read_environment(input: &[u8]) -> Result<Environment, AasxError> {
        let document = xml::parse_document(input)?;
        if document.root.local_name() != "aasenv" {
            return Err(AasxError::invalid_element(format!(
                "expected aasenv root, found {}",
                document.root.name
            )));
        }
        match document.root_namespace() {
            Some(namespace::AAS) => {}
            other => {
                return Err(AasxError::invalid_element(format!(
                    "unsupported AAS namespace {}",
                    other.unwrap_or("<none>")
                )));
            }
        }

        let mut objects = Vec::new();
        for section in &document.root.children {
            let (item_name, parse): (&str, fn(&XmlElement) -> Result<Identifiable, AasxError>) =
                match section.local_name() {
                    "assetAdministrationShells" => ("assetAdministrationShell", parse_shell),
                    "assets" => ("asset", parse_asset),
                    "submodels" => ("submodel", parse_submodel),
                    "conceptDescriptions" => ("conceptDescription", parse_concept_description),
                    other => {
                        tracing::warn!("Ignoring unknown aasenv section <{other}>");
                        continue;
                    }
                };
            for item in &section.children {
                if item.local_name() != item_name {
                    return Err(AasxError::invalid_element(format!(
                        "unexpected <{}> in <{}>",
                        item.name, section.name
                    )));
                }
                objects.push(parse(item)?);
            }
        }

        Ok(Environment {
            objects,
            namespaces: document.namespaces,
            attributes: document.root.attributes,
        })
    }

    /// Collects header fields, returning the children that were not consumed.
    fn parse_header(node: &XmlElement) -> Result<(IdentifiableHeader, Vec<&XmlElement>), AasxError> {
        let mut identification: Option<Identifier> = None;
        let mut id_short = None;
        let mut category = None;
        let mut rest = Vec::new();

        for child in &node.children {
            match child.local_name() {
                "idShort" => id_short = Some(child.text.clone()),
                "category" => category = Some(child.text.clone()),
                "identification" => {
                    let id_type = child.attribute("idType").unwrap_or("IRI");
                    let id_type = IdentifierType::parse(id_type).ok_or_else(|| {
                        AasxError::invalid_element(format!("unknown idType '{id_type}'"))
                    })?;
                    identification = Some(Identifier::new(child.text.trim(), id_type));
                }
                _ => rest.push(child),
            }
        }

        let identification = identification.ok_or_else(|| {
            AasxError::invalid_element(format!(
                "<{}> {} has no identification",
                node.name,
                id_short.as_deref().unwrap_or("<unnamed>")
            ))
        })?;

        let header = IdentifiableHeader {
            identification,
            id_short,
            category,
            extras: Vec::new(),
        };
        Ok((header, rest))
    }

    fn parse_shell(node: &XmlElement) -> Result<Identifiable, AasxError> {
        let (mut header, rest) = parse_header(node)?;
        let mut asset = Reference::default();
        let mut submodels = Vec::new();

        for child in rest {
            match child.local_name() {
                "assetRef" => asset = parse_reference(child)?,
                "submodelRefs" => {
                    for reference in child.children_named("submodelRef") {
                        submodels.push(parse_reference(reference)?);
                    }
                }
                _ => header.extras.push(child.clone()),
            }
        }

        sort_schema(&mut header.extras, order::SHELL);
        Ok(AssetAdministrationShell {
            header,
            asset,
            submodels,
        }
        .into())
    }

    fn parse_asset(node: &XmlElement) -> Result<Identifiable, AasxError> {
        let (mut header, rest) = parse_header(node)?;
        let mut kind = AssetKind::default();

        for child in rest {
            match child.local_name() {
                "kind" => {
                    kind = AssetKind::parse(child.text.trim()).ok_or_else(|| {
                        AasxError::invalid_element(format!("unknown asset kind '{}'", child.text))
                    })?;
                }
                _ => header.extras.push(child.clone()),
            }
        }

        sort_schema(&mut header.extras, order::ASSET);
        Ok(Asset { header, kind }.into())
    }

    fn parse_submodel(node: &XmlElement) -> Result<Identifiable, AasxError> {
        let (mut header, rest) = parse_header(node)?;
        let mut kind = None;
        let mut elements = ElementList::new();

        for child in rest {
            match child.local_name() {
                "kind" => kind = Some(parse_modeling_kind(child)?),
                "submodelElements" => elements = parse_element_list(child)?,
                _ => header.extras.push(child.clone()),
            }
        }

        sort_schema(&mut header.extras, order::SUBMODEL);
        Ok(Submodel {
            header,
            kind,
            elements,
        }
        .into())
    }

    fn parse_concept_description(node: &XmlElement) -> Result<Identifiable, AasxError> {
        let (mut header, rest) = parse_header(node)?;
        header.extras = rest.into_iter().cloned().collect();
        sort_schema(&mut header.extras, order::CONCEPT_DESCRIPTION);
        Ok(ConceptDescription { header }.into())
    }

    fn parse_modeling_kind(node: &XmlElement) -> Result<ModelingKind, AasxError> {
        ModelingKind::parse(node.text.trim())
            .ok_or_else(|| AasxError::invalid_element(format!("unknown kind '{}'", node.text)))
    }

    pub(super) fn parse_reference(node: &XmlElement) -> Result<Reference, AasxError> {
        let mut keys = Vec::new();
        if let Some(list) = node.child("keys") {
            for key in list.children_named("key") {
                let id_type = key.attribute("idType").unwrap_or("IRI");
                let id_type = KeyIdType::parse(id_type).ok_or_else(|| {
                    AasxError::invalid_reference(format!("unknown key idType '{id_type}'"))
                })?;
                keys.push(Key {
                    key_type: KeyType::parse(key.attribute("type").unwrap_or("")),
                    local: key.attribute("local").map(parse_bool).unwrap_or(false),
                    id_type,
                    value: key.text.trim().to_string(),
                });
            }
        }
        Ok(Reference::new(keys))
    }

    /// Parse a list of `<submodelElement>` wrappers.
    fn parse_element_list(node: &XmlElement) -> Result<ElementList, AasxError> {
        let mut list = ElementList::new();
        for wrapper in &node.children {
            let element = wrapper.children.first().ok_or_else(|| {
                AasxError::invalid_element(format!("empty <{}> in <{}>", wrapper.name, node.name))
            })?;
            list.add(parse_element(element)?)?;
        }
        Ok(list)
    }

    /// Collects referable fields, returning the children that were not consumed.
    fn parse_referable(node: &XmlElement) -> Result<(Referable, Vec<&XmlElement>), AasxError> {
        let mut id_short = None;
        let mut category = None;
        let mut kind = None;
        let mut rest = Vec::new();

        for child in &node.children {
            match child.local_name() {
                "idShort" => id_short = Some(child.text.clone()),
                "category" => category = Some(child.text.clone()),
                "kind" => kind = Some(parse_modeling_kind(child)?),
                _ => rest.push(child),
            }
        }

        let id_short = id_short
            .ok_or_else(|| AasxError::invalid_element(format!("<{}> has no idShort", node.name)))?;
        let referable = Referable {
            id_short,
            category,
            kind,
            extras: Vec::new(),
        };
        Ok((referable, rest))
    }

    fn parse_element(node: &XmlElement) -> Result<SubmodelElement, AasxError> {
        match node.local_name() {
            "property" => {
                let (mut referable, rest) = parse_referable(node)?;
                let mut value_type = String::new();
                let mut value = None;
                for child in rest {
                    match child.local_name() {
                        "valueType" => value_type = child.text.clone(),
                        "value" => value = Some(child.text.clone()),
                        _ => referable.extras.push(child.clone()),
                    }
                }
                sort_schema(&mut referable.extras, order::PROPERTY);
                Ok(SubmodelElement::Property(Property {
                    referable,
                    value_type,
                    value,
                }))
            }
            "file" => {
                let (mut referable, rest) = parse_referable(node)?;
                let mut mime_type = String::new();
                let mut value = None;
                for child in rest {
                    match child.local_name() {
                        "mimeType" => mime_type = child.text.clone(),
                        "value" => value = Some(child.text.clone()),
                        _ => referable.extras.push(child.clone()),
                    }
                }
                sort_schema(&mut referable.extras, order::FILE);
                Ok(SubmodelElement::File(File {
                    referable,
                    mime_type,
                    value,
                }))
            }
            "submodelElementCollection" => {
                let (mut referable, rest) = parse_referable(node)?;
                let mut ordered = false;
                let mut allow_duplicates = false;
                let mut value = ElementList::new();
                for child in rest {
                    match child.local_name() {
                        "ordered" => ordered = parse_bool(&child.text),
                        "allowDuplicates" => allow_duplicates = parse_bool(&child.text),
                        "value" => value = parse_element_list(child)?,
                        _ => referable.extras.push(child.clone()),
                    }
                }
                sort_schema(&mut referable.extras, order::COLLECTION);
                Ok(SubmodelElement::Collection(Collection {
                    referable,
                    ordered,
                    allow_duplicates,
                    value,
                }))
            }
            _ => Ok(SubmodelElement::Opaque(OpaqueElement {
                id_short: node.child_text("idShort").map(str::to_string),
                node: node.clone(),
            })),
        }
    }
}

// ============================================================================
// WRITER
// ============================================================================

mod writer {
    use super::*;

    const PREFIX: &str = "aas";

    fn aas(local: &str) -> String {
        format!("{PREFIX}:{local}")
    }

    fn text(local: &str, value: impl Into<String>) -> XmlElement {
        XmlElement::with_text(aas(local), value)
    }

    /// Merge typed children with carried-over extras in schema order.
    fn ordered(
        mut typed: Vec<XmlElement>,
        extras: &[XmlElement],
        order: &[&str],
    ) -> Vec<XmlElement> {
        typed.extend(extras.iter().cloned());
        sort_schema(&mut typed, order);
        typed
    }

    /// Canonical namespaces, then any further declarations carried from input.
    fn namespaces(environment: &Environment) -> IndexMap<String, String> {
        let mut result = IndexMap::new();
        result.insert(PREFIX.to_string(), namespace::AAS.to_string());
        result.insert("IEC".to_string(), namespace::IEC.to_string());
        result.insert("abac".to_string(), namespace::ABAC.to_string());
        result.insert("xsi".to_string(), namespace::XSI.to_string());
        for (prefix, uri) in &environment.namespaces {
            match result.get(prefix) {
                Some(existing) if existing != uri => {
                    tracing::debug!("Dropping conflicting namespace declaration {prefix}={uri}");
                }
                Some(_) => {}
                None => {
                    result.insert(prefix.clone(), uri.clone());
                }
            }
        }
        result
    }

    pub fn write_environment(environment: &Environment) -> Result<Vec<u8>, AasxError> {
        let mut shells = XmlElement::new(aas("assetAdministrationShells"));
        let mut assets = XmlElement::new(aas("assets"));
        let mut submodels = XmlElement::new(aas("submodels"));
        let mut concept_descriptions = XmlElement::new(aas("conceptDescriptions"));

        for object in &environment.objects {
            match object {
                Identifiable::Shell(s) => shells.children.push(shell_node(s)),
                Identifiable::Asset(a) => assets.children.push(asset_node(a)),
                Identifiable::Submodel(s) => submodels.children.push(submodel_node(s)),
                Identifiable::ConceptDescription(c) => {
                    concept_descriptions.children.push(concept_description_node(c));
                }
            }
        }

        let namespaces = namespaces(environment);
        let mut root = XmlElement::new(aas("aasenv"))
            .with_child(shells)
            .with_child(assets)
            .with_child(submodels)
            .with_child(concept_descriptions);
        for (key, value) in &environment.attributes {
            let prefix = key.split_once(':').map(|(prefix, _)| prefix);
            match prefix {
                Some(prefix) if !namespaces.contains_key(prefix) => {
                    tracing::debug!("Dropping root attribute {key} with undeclared prefix");
                }
                _ => root = root.with_attribute(key.as_str(), value.as_str()),
            }
        }

        xml::write_document(&XmlDocument { root, namespaces })
    }

    fn header_nodes(header: &IdentifiableHeader) -> Vec<XmlElement> {
        let mut nodes = Vec::new();
        if let Some(id_short) = &header.id_short {
            nodes.push(text("idShort", id_short.as_str()));
        }
        if let Some(category) = &header.category {
            nodes.push(text("category", category.as_str()));
        }
        nodes.push(
            text("identification", header.identification.as_str())
                .with_attribute("idType", header.identification.id_type.as_str()),
        );
        nodes
    }

    pub(super) fn reference_node(name: &str, reference: &Reference) -> XmlElement {
        let mut keys = XmlElement::new(aas("keys"));
        for key in &reference.keys {
            keys.children.push(
                text("key", key.value.as_str())
                    .with_attribute("type", key.key_type.as_str())
                    .with_attribute("local", if key.local { "true" } else { "false" })
                    .with_attribute("idType", key.id_type.as_str()),
            );
        }
        XmlElement::new(aas(name)).with_child(keys)
    }

    fn shell_node(shell: &AssetAdministrationShell) -> XmlElement {
        let mut typed = header_nodes(&shell.header);
        if !shell.asset.keys.is_empty() {
            typed.push(reference_node("assetRef", &shell.asset));
        }
        if !shell.submodels.is_empty() {
            let mut refs = XmlElement::new(aas("submodelRefs"));
            for reference in &shell.submodels {
                refs.children.push(reference_node("submodelRef", reference));
            }
            typed.push(refs);
        }
        XmlElement {
            children: ordered(typed, &shell.header.extras, order::SHELL),
            ..XmlElement::new(aas("assetAdministrationShell"))
        }
    }

    fn asset_node(asset: &Asset) -> XmlElement {
        let mut typed = header_nodes(&asset.header);
        typed.push(text("kind", asset.kind.as_str()));
        XmlElement {
            children: ordered(typed, &asset.header.extras, order::ASSET),
            ..XmlElement::new(aas("asset"))
        }
    }

    fn submodel_node(submodel: &Submodel) -> XmlElement {
        let mut typed = header_nodes(&submodel.header);
        if let Some(kind) = submodel.kind {
            typed.push(text("kind", kind.as_str()));
        }
        typed.push(element_list_node("submodelElements", &submodel.elements));
        XmlElement {
            children: ordered(typed, &submodel.header.extras, order::SUBMODEL),
            ..XmlElement::new(aas("submodel"))
        }
    }

    fn concept_description_node(cd: &ConceptDescription) -> XmlElement {
        XmlElement {
            children: ordered(
                header_nodes(&cd.header),
                &cd.header.extras,
                order::CONCEPT_DESCRIPTION,
            ),
            ..XmlElement::new(aas("conceptDescription"))
        }
    }

    fn element_list_node(name: &str, list: &ElementList) -> XmlElement {
        let mut node = XmlElement::new(aas(name));
        for element in list {
            node.children
                .push(XmlElement::new(aas("submodelElement")).with_child(element_node(element)));
        }
        node
    }

    fn referable_nodes(referable: &Referable) -> Vec<XmlElement> {
        let mut nodes = vec![text("idShort", referable.id_short.as_str())];
        if let Some(category) = &referable.category {
            nodes.push(text("category", category.as_str()));
        }
        if let Some(kind) = referable.kind {
            nodes.push(text("kind", kind.as_str()));
        }
        nodes
    }

    fn element_node(element: &SubmodelElement) -> XmlElement {
        match element {
            SubmodelElement::Property(p) => {
                let mut typed = referable_nodes(&p.referable);
                if !p.value_type.is_empty() {
                    typed.push(text("valueType", p.value_type.as_str()));
                }
                if let Some(value) = &p.value {
                    typed.push(text("value", value.as_str()));
                }
                XmlElement {
                    children: ordered(typed, &p.referable.extras, order::PROPERTY),
                    ..XmlElement::new(aas("property"))
                }
            }
            SubmodelElement::File(f) => {
                let mut typed = referable_nodes(&f.referable);
                typed.push(text("mimeType", f.mime_type.as_str()));
                if let Some(value) = &f.value {
                    typed.push(text("value", value.as_str()));
                }
                XmlElement {
                    children: ordered(typed, &f.referable.extras, order::FILE),
                    ..XmlElement::new(aas("file"))
                }
            }
            SubmodelElement::Collection(c) => {
                let mut typed = referable_nodes(&c.referable);
                typed.push(text("ordered", if c.ordered { "true" } else { "false" }));
                typed.push(text(
                    "allowDuplicates",
                    if c.allow_duplicates { "true" } else { "false" },
                ));
                typed.push(element_list_node("value", &c.value));
                XmlElement {
                    children: ordered(typed, &c.referable.extras, order::COLLECTION),
                    ..XmlElement::new(aas("submodelElementCollection"))
                }
            }
            SubmodelElement::Opaque(o) => o.node.clone(),
        }
    }
}
