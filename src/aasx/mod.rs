//! AASX package support.
//!
//! An AASX file is an Open Packaging Conventions zip archive. Spec parts hold
//! the serialized objects; supplementary files ride along as plain parts.
//!
//! ## Package Structure
//!
//! ```text
//! package.aasx (ZIP archive)
//! ├── [Content_Types].xml          # Default/Override content types
//! ├── _rels/.rels                  # → aasx-origin, core properties, thumbnail
//! ├── docProps/core.xml            # Core properties
//! ├── aasx/
//! │   ├── aasx-origin              # Anchor part
//! │   ├── _rels/aasx-origin.rels   # → aas-spec parts
//! │   └── Pump/
//! │       ├── Pump.aas.xml         # Spec part (aasenv)
//! │       ├── _rels/Pump.aas.xml.rels   # → aas-suppl, aas-spec-split
//! │       └── SimulationModels/
//! │           └── SimulationModels.submodel.xml   # with split parts
//! └── model.fmu                    # Supplementary file
//! ```

mod format;
mod opc;
mod reader;
mod writer;
mod xml;

use std::path::Path;

pub use format::{Environment, PartFormat, detect_format};
pub use opc::{
    ContentTypes, Relationship, Relationships, content_types, decode_part_name, encode_part_name,
    paths, rel_types,
};
pub use reader::AasxReader;
pub use writer::{AasxWriter, WriteOptions};
pub use xml::{AasXml, namespace};

use crate::error::AasxError;
use crate::store::DocumentStore;

/// Read a package from disk.
pub fn read_aasx_file(path: &Path) -> Result<DocumentStore, AasxError> {
    let bytes = std::fs::read(path).map_err(|e| AasxError::from(e).in_archive(path))?;
    AasxReader::new().read(&bytes).map_err(|e| e.in_archive(path))
}

/// Write a package to disk, replacing any existing file.
///
/// The archive is assembled in memory and written to a temporary file next to
/// `path`, which is then renamed over the destination. On error nothing is
/// left at `path`.
pub fn write_aasx_file(
    path: &Path,
    store: &DocumentStore,
    options: &WriteOptions,
) -> Result<(), AasxError> {
    let bytes = AasxWriter::new(*options)
        .write(store)
        .map_err(|e| e.in_archive(path))?;
    persist_atomically(path, &bytes).map_err(|e| AasxError::from(e).in_archive(path))?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn persist_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
