//! AASX package reader.

use std::collections::{HashSet, VecDeque};
use std::io::{Cursor, Read};

use indexmap::IndexMap;
use zip::ZipArchive;

use super::format::detect_format;
use super::opc::{self, ContentTypes, Relationships, paths, rel_types};
use crate::error::AasxError;
use crate::store::DocumentStore;

/// Reads a whole package into a [`DocumentStore`].
#[derive(Debug, Default)]
pub struct AasxReader;

impl AasxReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, input: &[u8]) -> Result<DocumentStore, AasxError> {
        let mut entries = read_entries(input)?;

        let content_types = entries
            .get(paths::CONTENT_TYPES)
            .ok_or_else(|| AasxError::corrupt("missing [Content_Types].xml"))
            .and_then(|bytes| ContentTypes::parse(bytes))?;
        let root_rels = entries
            .get(paths::ROOT_RELS)
            .ok_or_else(|| AasxError::corrupt("missing package relationships"))
            .and_then(|bytes| Relationships::parse(bytes))?;

        let mut consumed: HashSet<String> = HashSet::new();
        let mut store = DocumentStore::new();

        let origin = root_rels
            .of_type(rel_types::AASX_ORIGIN)
            .next()
            .map(|rel| target_part("/", &rel.target))
            .ok_or_else(|| AasxError::corrupt("missing aasx-origin relationship"))?;
        if !entries.contains_key(&origin) {
            return Err(AasxError::corrupt(format!("origin part {origin} is missing")));
        }
        consumed.insert(origin.clone());

        for rel in root_rels.of_type(rel_types::CORE_PROPERTIES) {
            let part = target_part("/", &rel.target);
            if let Some(bytes) = entries.get(&part) {
                store.meta.core_properties = Some(bytes.clone());
                consumed.insert(part);
            }
        }
        let thumbnail = root_rels
            .of_type(rel_types::THUMBNAIL)
            .next()
            .map(|rel| target_part("/", &rel.target));

        // Spec parts, following split relationships transitively
        let origin_rels = load_rels(&entries, &origin)?;
        let mut queue: VecDeque<String> = origin_rels
            .of_type(rel_types::AAS_SPEC)
            .map(|rel| target_part(&origin, &rel.target))
            .collect();
        if queue.is_empty() {
            tracing::warn!("Package declares no aas-spec parts");
        }
        let mut supplementary: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();

        while let Some(part) = queue.pop_front() {
            if !visited.insert(part.clone()) {
                continue;
            }
            let bytes = entries
                .get(&part)
                .ok_or_else(|| AasxError::corrupt(format!("spec part {part} is missing")))?;
            self.read_spec_part(&part, bytes, content_types.content_type_of(&part), &mut store)?;
            consumed.insert(part.clone());

            let rels = load_rels(&entries, &part)?;
            for rel in rels.of_type(rel_types::AAS_SPEC_SPLIT) {
                queue.push_back(target_part(&part, &rel.target));
            }
            for rel in rels.of_type(rel_types::AAS_SUPPL) {
                supplementary.push(target_part(&part, &rel.target));
            }
        }

        for part in supplementary {
            if consumed.contains(&part) || store.files.contains(&part) {
                continue;
            }
            match entries.shift_remove(&part) {
                Some(data) => {
                    let content_type = content_type_for(&content_types, &part);
                    store.files.add(&part, content_type, data);
                    consumed.insert(part);
                }
                None => tracing::warn!("Supplementary file {part} is referenced but missing"),
            }
        }

        // Anything left that is not package plumbing is carried as a file
        let leftovers: Vec<String> = entries
            .keys()
            .filter(|part| !consumed.contains(*part) && !is_plumbing(part))
            .cloned()
            .collect();
        for part in leftovers {
            if let Some(data) = entries.shift_remove(&part) {
                tracing::debug!("Carrying unreferenced part {part}");
                let content_type = content_type_for(&content_types, &part);
                store.files.add(&part, content_type, data);
            }
        }

        if let Some(thumbnail) = thumbnail {
            if store.files.contains(&thumbnail) {
                store.meta.thumbnail = Some(thumbnail);
            } else {
                tracing::warn!("Thumbnail {thumbnail} is referenced but missing");
            }
        }

        store.check_references()?;
        tracing::debug!(
            "Read package with {} objects and {} files",
            store.len(),
            store.files.len()
        );
        Ok(store)
    }

    fn read_spec_part(
        &self,
        part: &str,
        bytes: &[u8],
        content_type: Option<&str>,
        store: &mut DocumentStore,
    ) -> Result<(), AasxError> {
        let format = detect_format(part, content_type).ok_or_else(|| {
            AasxError::unsupported_part(
                part,
                format!(
                    "no serialization for content type {}",
                    content_type.unwrap_or("<unknown>")
                ),
            )
        })?;

        let environment = format
            .validate(bytes)
            .and_then(|()| format.read(bytes))
            .map_err(|e| AasxError::unsupported_part(part, e.to_string()))?;
        tracing::trace!(
            "Read {} objects from {part} as {}",
            environment.objects.len(),
            format.name()
        );

        for (prefix, uri) in environment.namespaces {
            store.meta.namespaces.entry(prefix).or_insert(uri);
        }
        for (key, value) in environment.attributes {
            if !store.meta.root_attributes.iter().any(|(k, _)| *k == key) {
                store.meta.root_attributes.push((key, value));
            }
        }
        for object in environment.objects {
            if store.get(object.identification()).is_some() {
                tracing::warn!(
                    "Duplicate identifier {} in {part}, keeping the first",
                    object.identification()
                );
                continue;
            }
            store.add(object)?;
        }
        Ok(())
    }
}

fn read_entries(input: &[u8]) -> Result<IndexMap<String, Vec<u8>>, AasxError> {
    let mut archive = ZipArchive::new(Cursor::new(input))
        .map_err(|e| AasxError::corrupt(format!("Failed to open archive: {e}")))?;

    let mut entries = IndexMap::new();
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| AasxError::corrupt(format!("Failed to read entry {index}: {e}")))?;
        if file.is_dir() {
            continue;
        }
        let name = opc::part_name(&opc::decode_part_name(file.name()));
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| AasxError::corrupt(format!("Failed to read {name}: {e}")))?;
        entries.insert(name, data);
    }
    Ok(entries)
}

fn target_part(source: &str, target: &str) -> String {
    opc::decode_part_name(&opc::resolve_target(source, target))
}

fn load_rels(entries: &IndexMap<String, Vec<u8>>, part: &str) -> Result<Relationships, AasxError> {
    match entries.get(&opc::rels_part_for(part)) {
        Some(bytes) => Relationships::parse(bytes),
        None => Ok(Relationships::new()),
    }
}

fn content_type_for(content_types: &ContentTypes, part: &str) -> String {
    content_types
        .content_type_of(part)
        .unwrap_or(opc::content_types::OCTET_STREAM)
        .to_string()
}

fn is_plumbing(part: &str) -> bool {
    part == paths::CONTENT_TYPES || (part.ends_with(".rels") && part.contains("/_rels/"))
}
