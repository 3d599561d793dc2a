//! Mapping of extracted FMU variables onto the simulation-model sub-tree.
//!
//! ```text
//! simulationModel01
//! ├── modelFile
//! │   └── fmuFile                 File → /<fmu name>
//! ├── paramMethod, paramFile, initStateMethod, initStateFile, ...
//! └── ports
//!     ├── portsConnector1
//!     │   ├── portConName, portConDescription, unit
//!     │   └── variable1
//!     │       └── variableName, variableDescription, unitDescription,
//!     │           type, causality, prefix, range
//!     └── portsConnector2 ...
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AasxError;
use crate::fmu::{self, ScalarVariable};
use crate::model::{
    Asset, AssetAdministrationShell, AssetKind, Collection, ElementList, File, IdentifiableHeader,
    Identifier, KeyType, ModelingKind, Property, Reference, Submodel,
};
use crate::store::DocumentStore;

/// id_short of the collection holding the port connectors.
pub const PORTS: &str = "ports";

/// Identifier scheme and literal values used when building the sub-tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Prefix of generated identifiers.
    pub base_iri: String,
    /// Mime type of File elements pointing at the FMU.
    pub fmu_mime_type: String,
    /// Value of the `paramMethod` and `initStateMethod` properties.
    pub param_method: String,
    /// Value of properties with no information available.
    pub unknown: String,
    /// id_short of the simulation model collection.
    pub simulation_model_id_short: String,
    /// id_short of the generated submodel.
    pub submodel_id_short: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            base_iri: "https://example.com/resources".to_string(),
            fmu_mime_type: "application/fmu".to_string(),
            param_method: "Link to para-file".to_string(),
            unknown: "UNKNOWN".to_string(),
            simulation_model_id_short: "simulationModel01".to_string(),
            submodel_id_short: "SimulationModels".to_string(),
        }
    }
}

impl MappingConfig {
    fn identifier(&self, kind: &str, id_short: &str) -> Identifier {
        Identifier::iri(format!(
            "{}/{kind}/{id_short}",
            self.base_iri.trim_end_matches('/')
        ))
    }
}

/// One `portsConnector<n>` collection.
pub fn port_connector(id_short: &str, variable: &ScalarVariable) -> Result<Collection, AasxError> {
    let details = Collection::ordered("variable1")
        .with(Property::string("variableName", variable.name.as_str()))?
        .with(Property::string(
            "variableDescription",
            variable.description.as_str(),
        ))?
        .with(Property::string("unitDescription", variable.unit.as_str()))?
        .with(Property::string("type", variable.declared_type.as_str()))?
        .with(Property::string("causality", variable.causality.as_str()))?
        .with(Property::string("prefix", variable.prefix.as_str()))?
        .with(Property::string("range", variable.range.as_str()))?;

    Collection::ordered(id_short)
        .with(Property::string("portConName", variable.name.as_str()))?
        .with(Property::string(
            "portConDescription",
            variable.description.as_str(),
        ))?
        .with(Property::string("unit", variable.unit.as_str()))?
        .with(details)
}

/// The `ports` collection, numbered from 1 in variable order.
pub fn ports_collection(variables: &[ScalarVariable]) -> Result<Collection, AasxError> {
    let mut ports = Collection::ordered(PORTS);
    for (index, variable) in variables.iter().enumerate() {
        let connector = port_connector(&format!("portsConnector{}", index + 1), variable)?;
        ports.value.add(connector.into())?;
    }
    Ok(ports)
}

/// A complete simulation model collection describing one FMU.
pub fn simulation_model(
    id_short: &str,
    fmu_file_name: &str,
    variables: &[ScalarVariable],
    config: &MappingConfig,
) -> Result<Collection, AasxError> {
    let fmu_path = format!("/{fmu_file_name}");
    let mime = config.fmu_mime_type.as_str();

    let model_file =
        Collection::ordered("modelFile").with(File::new("fmuFile", mime, fmu_path.as_str()))?;

    Collection::ordered(id_short)
        .with(model_file)?
        .with(Property::string("paramMethod", config.param_method.as_str()))?
        .with(File::new("paramFile", mime, fmu_path.as_str()))?
        .with(Property::string(
            "initStateMethod",
            config.param_method.as_str(),
        ))?
        .with(File::new("initStateFile", mime, fmu_path.as_str()))?
        .with(Property::string(
            "refSimDocumentation01",
            config.unknown.as_str(),
        ))?
        .with(Property::string("integrationMethod", config.unknown.as_str()))?
        .with(Property::string("licenceModel", config.unknown.as_str()))?
        .with(Collection::ordered("levelOfDetail"))?
        .with(Collection::ordered("simulationSupportContact"))?
        .with(Property::string(
            "engineeringDomain01",
            config.unknown.as_str(),
        ))?
        .with(Collection::ordered("solverAndTolerances01"))?
        .with(Collection::ordered("simPurpose"))?
        .with(Collection::ordered("environment"))?
        .with(ports_collection(variables)?)
}

/// Build a fresh package for one FMU: asset, shell and simulation submodel,
/// with the FMU embedded as a supplementary file.
pub fn build_package(
    aas_id_short: &str,
    fmu_path: &Path,
    config: &MappingConfig,
) -> Result<DocumentStore, AasxError> {
    let file_name = fmu_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            AasxError::from(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no usable file name", fmu_path.display()),
            ))
        })?;
    let fmu_bytes = std::fs::read(fmu_path).map_err(|e| AasxError::from(e).in_archive(fmu_path))?;
    let descriptor = fmu::read_descriptor(&fmu_bytes).map_err(|e| e.in_archive(fmu_path))?;
    let variables =
        fmu::parse_model_description(&descriptor).map_err(|e| e.in_archive(fmu_path))?;

    let asset_id = config.identifier("asset", aas_id_short);
    let submodel_id = config.identifier("sm", aas_id_short);
    let shell_id = config.identifier("aas", aas_id_short);

    let mut elements = ElementList::new();
    elements.add(
        simulation_model(
            &config.simulation_model_id_short,
            file_name,
            &variables,
            config,
        )?
        .into(),
    )?;

    let mut store = DocumentStore::new();
    store.add(Asset {
        header: IdentifiableHeader::new(asset_id.clone(), Some(aas_id_short.to_string())),
        kind: AssetKind::Instance,
    })?;
    store.add(Submodel {
        header: IdentifiableHeader::new(
            submodel_id.clone(),
            Some(config.submodel_id_short.clone()),
        ),
        kind: Some(ModelingKind::Instance),
        elements,
    })?;
    store.add(AssetAdministrationShell {
        header: IdentifiableHeader::new(shell_id, Some(aas_id_short.to_string())),
        asset: Reference::to_identifiable(KeyType::Asset, &asset_id),
        submodels: vec![Reference::to_identifiable(KeyType::Submodel, &submodel_id)],
    })?;
    store
        .files
        .add(file_name, config.fmu_mime_type.as_str(), fmu_bytes);

    tracing::info!(
        "Built package {aas_id_short} with {} ports from {file_name}",
        variables.len()
    );
    Ok(store)
}
