//! # fmu-to-aasx
//!
//! Packages the interface of a simulation component (the scalar variables of
//! an FMU) into an Asset Administration Shell package (AASX, metamodel v2.0).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! merge     → Read-modify-write session on an existing package
//!   ↓
//! mapping   → Ports and simulation-model sub-trees, new packages
//!   ↓
//! fmu       → Scalar variables from modelDescription.xml
//!   ↓
//! aasx      → OPC container codec, AAS XML spec parts
//!   ↓
//! store     → Identifiables by identifier, supplementary files
//!   ↓
//! model     → Identifiables, references, submodel element tree
//!   ↓
//! xml       → Owned XML element tree
//! ```

// ============================================================================
// MODULES (dependency order: xml → model → store → aasx → fmu → mapping → merge)
// ============================================================================

/// Error type shared by every module
pub mod error;

/// Owned XML element tree over quick-xml
pub mod xml;

/// Document model: identifiables, references, elements
pub mod model;

/// Document store and reference resolution
pub mod store;

/// AASX package reading and writing
pub mod aasx;

/// FMU variable extraction
pub mod fmu;

/// Mapping of variables onto the simulation-model sub-tree
pub mod mapping;

/// Merging ports into existing packages
pub mod merge;

/// Tool configuration
pub mod config;

pub use aasx::{WriteOptions, read_aasx_file, write_aasx_file};
pub use config::ToolConfig;
pub use error::AasxError;
pub use fmu::{ScalarVariable, parse_model_variables};
pub use mapping::{MappingConfig, build_package};
pub use merge::{MergeReport, MergeSession, add_ports_to_existing_aasx};
pub use store::DocumentStore;
