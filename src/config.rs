//! Tool configuration, loaded from a JSON file.
//!
//! ```json
//! {
//!   "mapping": { "base_iri": "https://plant.example/resources", "unknown": "n/a" },
//!   "write": { "submodel_split_parts": true }
//! }
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aasx::WriteOptions;
use crate::error::AasxError;
use crate::mapping::MappingConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub mapping: MappingConfig,
    pub write: WriteOptions,
}

impl ToolConfig {
    pub fn load(path: &Path) -> Result<Self, AasxError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AasxError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
            .map_err(|e| AasxError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
