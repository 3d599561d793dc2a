//! Read-modify-write of an existing package.
//!
//! A [`MergeSession`] walks through its states in a fixed order, each
//! transition consuming the previous state:
//!
//! ```text
//! Unopened ─open→ Loaded ─locate→ Located ─replace_ports→ Mutated ─write→ Written ─close→ MergeReport
//! ```
//!
//! The input archive is only read. Nothing is written before the final
//! transition, and the output is persisted atomically.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::aasx::{self, WriteOptions};
use crate::error::AasxError;
use crate::fmu::{self, ScalarVariable};
use crate::mapping::{self, PORTS};
use crate::model::{IdShortPath, SubmodelElement};
use crate::store::DocumentStore;

/// Session states.
pub mod state {
    #[derive(Debug)]
    pub struct Unopened;
    #[derive(Debug)]
    pub struct Loaded;
    #[derive(Debug)]
    pub struct Located;
    #[derive(Debug)]
    pub struct Mutated;
    #[derive(Debug)]
    pub struct Written;
}

use state::{Loaded, Located, Mutated, Unopened, Written};

/// Where the ports were put.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Target {
    submodel: String,
    path: IdShortPath,
}

/// Outcome of a finished merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub submodel: String,
    pub collection: String,
    /// Number of port connectors written.
    pub ports: usize,
    /// Whether an existing `ports` collection was replaced.
    pub replaced: bool,
}

/// A merge in progress. `S` is one of the [`state`] markers.
#[derive(Debug)]
pub struct MergeSession<S> {
    input: PathBuf,
    store: DocumentStore,
    target: Option<Target>,
    ports: usize,
    replaced: bool,
    output: Option<PathBuf>,
    _state: PhantomData<S>,
}

impl<S> MergeSession<S> {
    fn into_state<T>(self) -> MergeSession<T> {
        MergeSession {
            input: self.input,
            store: self.store,
            target: self.target,
            ports: self.ports,
            replaced: self.replaced,
            output: self.output,
            _state: PhantomData,
        }
    }

    /// Package being merged into.
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}

impl MergeSession<Unopened> {
    pub fn open(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            store: DocumentStore::new(),
            target: None,
            ports: 0,
            replaced: false,
            output: None,
            _state: PhantomData,
        }
    }

    /// Read the whole input package.
    pub fn load(self) -> Result<MergeSession<Loaded>, AasxError> {
        let store = aasx::read_aasx_file(&self.input)?;
        tracing::debug!(
            "Loaded {} with {} objects",
            self.input.display(),
            store.len()
        );
        Ok(MergeSession { store, ..self }.into_state())
    }
}

impl MergeSession<Loaded> {
    /// Find the collection that receives the ports.
    pub fn locate(
        self,
        submodel_id: &str,
        path: &IdShortPath,
    ) -> Result<MergeSession<Located>, AasxError> {
        let submodel = self.store.submodel(submodel_id)?;
        match submodel.elements.resolve(path) {
            Some(SubmodelElement::Collection(_)) => {}
            Some(_) | None => return Err(AasxError::path_not_found(path.to_string())),
        }
        let target = Target {
            submodel: submodel_id.to_string(),
            path: path.clone(),
        };
        Ok(MergeSession {
            target: Some(target),
            ..self
        }
        .into_state())
    }
}

impl MergeSession<Located> {
    /// Replace the `ports` collection of the located target.
    pub fn replace_ports(
        mut self,
        variables: &[ScalarVariable],
    ) -> Result<MergeSession<Mutated>, AasxError> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| AasxError::path_not_found("<unlocated>"))?;
        let replaced =
            replace_ports_in_store(&mut self.store, &target.submodel, &target.path, variables)?;
        self.ports = variables.len();
        self.replaced = replaced;
        Ok(self.into_state())
    }
}

impl MergeSession<Mutated> {
    /// Serialize the store to `output`, which must not be the input path.
    pub fn write(
        mut self,
        output: impl Into<PathBuf>,
        options: &WriteOptions,
    ) -> Result<MergeSession<Written>, AasxError> {
        let output = output.into();
        if same_file(&self.input, &output) {
            return Err(AasxError::InvalidOutput(format!(
                "{} is the input package",
                output.display()
            )));
        }
        aasx::write_aasx_file(&output, &self.store, options)?;
        self.output = Some(output);
        Ok(self.into_state())
    }
}

impl MergeSession<Written> {
    pub fn close(self) -> MergeReport {
        let (submodel, collection) = self
            .target
            .map(|t| (t.submodel, t.path.to_string()))
            .unwrap_or_default();
        MergeReport {
            output: self.output.unwrap_or_default(),
            input: self.input,
            submodel,
            collection,
            ports: self.ports,
            replaced: self.replaced,
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Remove any `ports` child of the target collection and append a fresh one.
///
/// Returns whether an existing `ports` collection was removed.
pub fn replace_ports_in_store(
    store: &mut DocumentStore,
    submodel_id: &str,
    path: &IdShortPath,
    variables: &[ScalarVariable],
) -> Result<bool, AasxError> {
    let ports = mapping::ports_collection(variables)?;
    let submodel = store.submodel_mut(submodel_id)?;
    let collection = submodel
        .elements
        .resolve_mut(path)
        .and_then(SubmodelElement::as_collection_mut)
        .ok_or_else(|| AasxError::path_not_found(path.to_string()))?;

    let replaced = collection.value.remove(PORTS).is_some();
    collection.value.add(ports.into())?;
    tracing::debug!(
        "{} ports under {submodel_id}/{path} ({} connectors)",
        if replaced { "Replaced" } else { "Added" },
        variables.len()
    );
    Ok(replaced)
}

/// Merge the ports of `fmu` into the collection at `collection_path` of
/// submodel `submodel_id` in `input`, writing the result to `output`.
pub fn add_ports_to_existing_aasx(
    input: &Path,
    fmu: &Path,
    submodel_id: &str,
    collection_path: &str,
    output: &Path,
    options: &WriteOptions,
) -> Result<MergeReport, AasxError> {
    let path = IdShortPath::parse(collection_path)?;
    let variables = fmu::parse_model_variables(fmu)?;
    let report = MergeSession::open(input)
        .load()?
        .locate(submodel_id, &path)?
        .replace_ports(&variables)?
        .write(output, options)?
        .close();
    tracing::info!(
        "Merged {} ports into {} -> {}",
        report.ports,
        input.display(),
        output.display()
    );
    Ok(report)
}
