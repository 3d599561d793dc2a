//! AASX package writer.
//!
//! Every write produces a complete package from the store; nothing of the
//! input archive is copied byte-for-byte except supplementary files and the
//! core properties part.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::format::{Environment, PartFormat};
use super::opc::{self, ContentTypes, Relationships, content_types, paths, rel_types};
use super::xml::AasXml;
use crate::error::AasxError;
use crate::model::{Identifiable, Identifier};
use crate::store::DocumentStore;
use crate::xml::{self, XmlDocument, XmlElement};

/// Options controlling package layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Write each submodel to its own part linked by `aas-spec-split`.
    pub submodel_split_parts: bool,
}

/// One planned spec part.
#[derive(Debug)]
struct SpecPart {
    path: String,
    objects: Vec<Identifier>,
    /// Indices of split parts owned by this part.
    splits: Vec<usize>,
    /// Whether the origin links to this part directly.
    top_level: bool,
}

/// Writes a [`DocumentStore`] as an AASX package.
#[derive(Debug, Default)]
pub struct AasxWriter {
    options: WriteOptions,
    format: AasXml,
}

impl AasxWriter {
    pub fn new(options: WriteOptions) -> Self {
        Self {
            options,
            format: AasXml,
        }
    }

    pub fn write(&self, store: &DocumentStore) -> Result<Vec<u8>, AasxError> {
        let parts = self.plan(store);
        check_file_paths(store, &parts)?;

        let mut buffer = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buffer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let put = |zip: &mut ZipWriter<&mut Cursor<Vec<u8>>>,
                   part: &str,
                   data: &[u8]|
         -> Result<(), AasxError> {
            zip.start_file(opc::entry_name(part), options)
                .map_err(zip_error)?;
            zip.write_all(data)?;
            tracing::trace!("Wrote part {part} ({} bytes)", data.len());
            Ok(())
        };

        put(&mut zip, paths::CONTENT_TYPES, &content_type_table(store).to_xml()?)?;

        let mut root_rels = Relationships::new();
        root_rels.add(rel_types::AASX_ORIGIN, paths::ORIGIN);
        root_rels.add(rel_types::CORE_PROPERTIES, paths::CORE_PROPERTIES);
        if let Some(thumbnail) = &store.meta.thumbnail {
            if store.files.contains(thumbnail) {
                root_rels.add(rel_types::THUMBNAIL, opc::encode_part_name(thumbnail));
            }
        }
        put(&mut zip, paths::ROOT_RELS, &root_rels.to_xml()?)?;

        let core = match &store.meta.core_properties {
            Some(bytes) => bytes.clone(),
            None => default_core_properties()?,
        };
        put(&mut zip, paths::CORE_PROPERTIES, &core)?;

        put(&mut zip, paths::ORIGIN, b"Intentionally empty.")?;
        let mut origin_rels = Relationships::new();
        for part in parts.iter().filter(|p| p.top_level) {
            origin_rels.add(rel_types::AAS_SPEC, opc::encode_part_name(&part.path));
        }
        put(&mut zip, &opc::rels_part_for(paths::ORIGIN), &origin_rels.to_xml()?)?;

        for part in &parts {
            let environment = Environment {
                objects: part
                    .objects
                    .iter()
                    .filter_map(|id| store.get(id).cloned())
                    .collect(),
                namespaces: store.meta.namespaces.clone(),
                attributes: store.meta.root_attributes.clone(),
            };
            put(&mut zip, &part.path, &self.format.write(&environment)?)?;

            let mut rels = Relationships::new();
            for &split in &part.splits {
                rels.add(
                    rel_types::AAS_SPEC_SPLIT,
                    opc::encode_part_name(&parts[split].path),
                );
            }
            for file in referenced_files(store, &environment.objects) {
                rels.add(rel_types::AAS_SUPPL, opc::encode_part_name(&file));
            }
            if !rels.is_empty() {
                put(&mut zip, &opc::rels_part_for(&part.path), &rels.to_xml()?)?;
            }
            tracing::debug!(
                "Spec part {} holds {} objects",
                part.path,
                environment.objects.len()
            );
        }

        for (path, file) in store.files.iter() {
            put(&mut zip, &opc::encode_part_name(path), &file.data)?;
        }

        zip.finish().map_err(zip_error)?;
        Ok(buffer.into_inner())
    }

    /// Decide which objects go into which spec part.
    fn plan(&self, store: &DocumentStore) -> Vec<SpecPart> {
        let mut parts: Vec<SpecPart> = Vec::new();
        let mut assigned: HashSet<Identifier> = HashSet::new();
        let mut names = UniqueNames::default();

        for shell in store.shells() {
            let aas_name = names.claim(shell.header.id_short.as_deref().unwrap_or("aas"));
            let index = parts.len();
            parts.push(SpecPart {
                path: format!("/aasx/{aas_name}/{aas_name}.aas.xml"),
                objects: vec![shell.header.identification.clone()],
                splits: Vec::new(),
                top_level: true,
            });
            assigned.insert(shell.header.identification.clone());

            let mut submodel_names = UniqueNames::default();
            for reference in std::iter::once(&shell.asset).chain(shell.submodels.iter()) {
                let Some(target) = store.resolve(reference) else {
                    continue;
                };
                let id = target.identification().clone();
                if !assigned.insert(id.clone()) {
                    continue;
                }
                match target {
                    Identifiable::Submodel(submodel) if self.options.submodel_split_parts => {
                        let sm_name = submodel_names
                            .claim(submodel.header.id_short.as_deref().unwrap_or("submodel"));
                        let split = parts.len();
                        parts.push(SpecPart {
                            path: format!("/aasx/{aas_name}/{sm_name}/{sm_name}.submodel.xml"),
                            objects: vec![id],
                            splits: Vec::new(),
                            top_level: false,
                        });
                        parts[index].splits.push(split);
                    }
                    _ => parts[index].objects.push(id),
                }
            }
        }

        let orphans: Vec<Identifier> = store
            .iter()
            .map(|o| o.identification().clone())
            .filter(|id| !assigned.contains(id))
            .collect();
        if !orphans.is_empty() || parts.is_empty() {
            match parts.first_mut() {
                Some(first) => first.objects.extend(orphans),
                None => parts.push(SpecPart {
                    path: "/aasx/data.aas.xml".to_string(),
                    objects: orphans,
                    splits: Vec::new(),
                    top_level: true,
                }),
            }
        }
        parts
    }
}

/// Sanitized part names, made unique by suffixing.
#[derive(Default)]
struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    fn claim(&mut self, raw: &str) -> String {
        let mut base: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if base.is_empty() {
            base.push_str("part");
        }
        let mut name = base.clone();
        let mut counter = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{base}_{counter}");
            counter += 1;
        }
        name
    }
}

/// Supplementary files referenced by file elements of the given objects,
/// including those nested in element kinds carried as XML.
fn referenced_files(store: &DocumentStore, objects: &[Identifiable]) -> IndexSet<String> {
    let mut files = IndexSet::new();
    for submodel in objects.iter().filter_map(Identifiable::as_submodel) {
        submodel.elements.for_each_file_value(&mut |value| {
            if value.is_empty() || value.contains("://") {
                return;
            }
            let path = if value.starts_with('/') {
                value.to_string()
            } else {
                format!("/{value}")
            };
            if store.files.contains(&path) {
                files.insert(path);
            }
        });
    }
    files
}

fn content_type_table(store: &DocumentStore) -> ContentTypes {
    let mut types = ContentTypes::new();
    types.add_default("rels", content_types::RELATIONSHIPS);
    types.add_default("xml", content_types::XML);
    types.add_override(paths::ORIGIN, content_types::ORIGIN);
    types.add_override(paths::CORE_PROPERTIES, content_types::CORE_PROPERTIES);
    for (path, file) in store.files.iter() {
        types.add_override(path, file.content_type.as_str());
    }
    types
}

/// Refuse files whose path would overwrite package plumbing or a spec part.
fn check_file_paths(store: &DocumentStore, parts: &[SpecPart]) -> Result<(), AasxError> {
    let mut reserved: IndexMap<String, &'static str> = IndexMap::new();
    for path in [
        paths::CONTENT_TYPES,
        paths::ROOT_RELS,
        paths::ORIGIN,
        paths::CORE_PROPERTIES,
    ] {
        reserved.insert(path.to_string(), "package part");
    }
    reserved.insert(opc::rels_part_for(paths::ORIGIN), "package part");
    for part in parts {
        reserved.insert(part.path.clone(), "spec part");
        reserved.insert(opc::rels_part_for(&part.path), "relationship part");
    }

    for (path, _) in store.files.iter() {
        if let Some(kind) = reserved.get(path) {
            return Err(AasxError::invalid_element(format!(
                "supplementary file {path} collides with a {kind}"
            )));
        }
    }
    Ok(())
}

fn default_core_properties() -> Result<Vec<u8>, AasxError> {
    let mut namespaces = IndexMap::new();
    namespaces.insert(
        "cp".to_string(),
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties".to_string(),
    );
    namespaces.insert(
        "dc".to_string(),
        "http://purl.org/dc/elements/1.1/".to_string(),
    );
    let root = XmlElement::new("cp:coreProperties")
        .with_child(XmlElement::with_text("dc:creator", env!("CARGO_PKG_NAME")));
    xml::write_document(&XmlDocument { root, namespaces })
}

fn zip_error(e: zip::result::ZipError) -> AasxError {
    AasxError::Io(std::io::Error::other(e))
}
