//! Merging ports into packages written by other tools.

use fmu_aasx::model::{IdShortPath, SubmodelElement};
use fmu_aasx::{
    AasxError, MergeSession, WriteOptions, add_ports_to_existing_aasx, parse_model_variables,
    read_aasx_file,
};

use crate::helpers::fixtures::{
    DATASHEET_PATH, FILTER_VARIABLES, MANUAL_PATH, NAMEPLATE_ID, SIM_SUBMODEL_ID, TANK_VARIABLES,
    entity_package, foreign_package, json_package, supplementary_targets, write_file, write_fmu,
};
use crate::helpers::store_assertions::{
    assert_files_equal, assert_objects_equal_except, child_ids, collection_at, property_value,
};

const TARGET: &str = "simulationModel01";

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn package(&self, name: &str, with_stale_ports: bool) -> std::path::PathBuf {
        write_file(self.dir.path(), name, &foreign_package(with_stale_ports))
    }

    fn fmu(&self, variables: &str) -> std::path::PathBuf {
        write_fmu(self.dir.path(), "model.fmu", variables)
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

#[test]
fn test_merge_leaves_unrelated_content_untouched() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    let report = add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &output,
        &WriteOptions::default(),
    )
    .expect("merge");
    assert_eq!(report.ports, 3);
    assert!(!report.replaced);
    assert_eq!(report.output, output);

    let before = read_aasx_file(&input).expect("read input");
    let after = read_aasx_file(&output).expect("read output");
    assert_objects_equal_except(&before, &after, SIM_SUBMODEL_ID);
    assert_files_equal(&before, &after);
    assert_eq!(after.meta.core_properties, before.meta.core_properties);
    assert_eq!(after.meta.thumbnail, before.meta.thumbnail);

    let nameplate = after.submodel(NAMEPLATE_ID).expect("nameplate");
    match nameplate.elements.get("Manual") {
        Some(SubmodelElement::File(file)) => assert_eq!(file.value.as_deref(), Some(MANUAL_PATH)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_merge_keeps_documents_nested_in_entities() {
    let ws = Workspace::new();
    let input = write_file(ws.dir.path(), "entity.aasx", &entity_package());
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &output,
        &WriteOptions::default(),
    )
    .expect("merge");

    let bytes = std::fs::read(&output).expect("read output bytes");
    let targets = supplementary_targets(&bytes);
    assert!(targets.iter().any(|t| t == MANUAL_PATH), "{targets:?}");
    assert!(
        targets.iter().any(|t| t == "/aasx/files/data%20sheet.pdf"),
        "{targets:?}"
    );

    let after = read_aasx_file(&output).expect("read output");
    let datasheet = after.files.get(DATASHEET_PATH).expect("datasheet");
    assert_eq!(datasheet.data, b"%PDF-1.4 datasheet");
}

#[test]
fn test_merge_keeps_siblings_of_ports() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &output,
        &WriteOptions::default(),
    )
    .expect("merge");

    let after = read_aasx_file(&output).expect("read output");
    let model = collection_at(&after, SIM_SUBMODEL_ID, TARGET);
    assert_eq!(child_ids(model), ["licenceModel", "stepSize", "ports"]);
    assert_eq!(property_value(model, "licenceModel"), "Proprietary");
    assert!(matches!(
        model.value.get("stepSize"),
        Some(SubmodelElement::Opaque(_))
    ));

    let ports = collection_at(&after, SIM_SUBMODEL_ID, "simulationModel01.ports");
    assert_eq!(
        child_ids(ports),
        ["portsConnector1", "portsConnector2", "portsConnector3"]
    );
    let semantic = after
        .submodel(SIM_SUBMODEL_ID)
        .expect("submodel")
        .header
        .extras
        .iter()
        .any(|extra| extra.local_name() == "semanticId");
    assert!(semantic, "submodel semanticId lost");
}

#[test]
fn test_stale_ports_are_replaced_not_appended() {
    let ws = Workspace::new();
    let stale = ws.package("stale.aasx", true);
    let fresh = ws.package("fresh.aasx", false);
    let fmu = ws.fmu(FILTER_VARIABLES);
    let options = WriteOptions::default();

    let report = add_ports_to_existing_aasx(
        &stale,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &ws.path("stale_out.aasx"),
        &options,
    )
    .expect("merge stale");
    assert!(report.replaced);
    add_ports_to_existing_aasx(
        &fresh,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &ws.path("fresh_out.aasx"),
        &options,
    )
    .expect("merge fresh");

    let from_stale = read_aasx_file(&ws.path("stale_out.aasx")).expect("read");
    let from_fresh = read_aasx_file(&ws.path("fresh_out.aasx")).expect("read");
    let stale_ports = collection_at(&from_stale, SIM_SUBMODEL_ID, "simulationModel01.ports");
    let fresh_ports = collection_at(&from_fresh, SIM_SUBMODEL_ID, "simulationModel01.ports");
    assert_eq!(stale_ports, fresh_ports);
    assert_eq!(child_ids(stale_ports), ["portsConnector1"]);

    let model = collection_at(&from_stale, SIM_SUBMODEL_ID, TARGET);
    let port_collections = model
        .value
        .iter()
        .filter(|e| e.id_short() == Some("ports"))
        .count();
    assert_eq!(port_collections, 1);
}

#[test]
fn test_merge_twice_is_idempotent() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let once = ws.path("once.aasx");
    let twice = ws.path("twice.aasx");
    let options = WriteOptions::default();

    add_ports_to_existing_aasx(&input, &fmu, SIM_SUBMODEL_ID, TARGET, &once, &options)
        .expect("first merge");
    let report = add_ports_to_existing_aasx(&once, &fmu, SIM_SUBMODEL_ID, TARGET, &twice, &options)
        .expect("second merge");
    assert!(report.replaced);

    let first = read_aasx_file(&once).expect("read");
    let second = read_aasx_file(&twice).expect("read");
    assert_eq!(first.len(), second.len());
    for object in first.iter() {
        assert_eq!(second.get(object.identification()), Some(object));
    }
    assert_files_equal(&first, &second);
}

#[test]
fn test_output_equal_to_input_is_rejected() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let original = std::fs::read(&input).expect("read");
    let fmu = ws.fmu(TANK_VARIABLES);

    let err = add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &input,
        &WriteOptions::default(),
    )
    .expect_err("same path");
    assert!(matches!(err.root(), AasxError::InvalidOutput(_)));
    assert_eq!(std::fs::read(&input).expect("read"), original);
}

#[test]
fn test_output_alias_of_input_is_rejected() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let alias = ws.dir.path().join(".").join("in.aasx");

    let err = add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &alias,
        &WriteOptions::default(),
    )
    .expect_err("aliased path");
    assert!(matches!(err.root(), AasxError::InvalidOutput(_)));
}

#[test]
fn test_unknown_submodel_is_not_found() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    let err = add_ports_to_existing_aasx(
        &input,
        &fmu,
        "urn:example:sm:missing",
        TARGET,
        &output,
        &WriteOptions::default(),
    )
    .expect_err("missing submodel");
    assert!(matches!(err.root(), AasxError::NotFound { .. }));
    assert!(!output.exists());
}

#[test]
fn test_unknown_collection_path_is_not_found() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    for path in ["simulationModel02", "simulationModel01.licenceModel"] {
        let err = add_ports_to_existing_aasx(
            &input,
            &fmu,
            SIM_SUBMODEL_ID,
            path,
            &output,
            &WriteOptions::default(),
        )
        .expect_err("bad path");
        assert!(
            matches!(err.root(), AasxError::NotFound { .. }),
            "{path}: {err}"
        );
        assert!(!output.exists());
    }
}

#[test]
fn test_corrupt_input_is_reported() {
    let ws = Workspace::new();
    let input = write_file(ws.dir.path(), "broken.aasx", b"PK\x03\x04 truncated");
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    let err = add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &output,
        &WriteOptions::default(),
    )
    .expect_err("corrupt");
    assert!(matches!(err.root(), AasxError::CorruptContainer(_)));
    assert!(!output.exists());
}

#[test]
fn test_json_package_is_unsupported() {
    let ws = Workspace::new();
    let input = write_file(ws.dir.path(), "json.aasx", &json_package());
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("out.aasx");

    let err = add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &output,
        &WriteOptions::default(),
    )
    .expect_err("json");
    assert!(matches!(err.root(), AasxError::UnsupportedPart { .. }));
    assert!(!output.exists());
}

#[test]
fn test_session_steps_and_report() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", true);
    let fmu = ws.fmu(TANK_VARIABLES);
    let variables = parse_model_variables(&fmu).expect("variables");
    let path = IdShortPath::parse(TARGET).expect("path");

    let loaded = MergeSession::open(&input).load().expect("load");
    assert_eq!(loaded.input(), input.as_path());
    assert!(loaded.store().submodel(SIM_SUBMODEL_ID).is_ok());

    let report = loaded
        .locate(SIM_SUBMODEL_ID, &path)
        .expect("locate")
        .replace_ports(&variables)
        .expect("replace")
        .write(ws.path("out.aasx"), &WriteOptions::default())
        .expect("write")
        .close();
    assert_eq!(report.submodel, SIM_SUBMODEL_ID);
    assert_eq!(report.collection, TARGET);
    assert_eq!(report.ports, 3);
    assert!(report.replaced);
}

#[test]
fn test_split_output_reads_back() {
    let ws = Workspace::new();
    let input = ws.package("in.aasx", false);
    let fmu = ws.fmu(TANK_VARIABLES);
    let output = ws.path("split.aasx");

    add_ports_to_existing_aasx(
        &input,
        &fmu,
        SIM_SUBMODEL_ID,
        TARGET,
        &output,
        &WriteOptions {
            submodel_split_parts: true,
        },
    )
    .expect("merge");

    let before = read_aasx_file(&input).expect("read input");
    let after = read_aasx_file(&output).expect("read output");
    assert_objects_equal_except(&before, &after, SIM_SUBMODEL_ID);
    assert_files_equal(&before, &after);
}
