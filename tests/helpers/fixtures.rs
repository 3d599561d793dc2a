//! In-memory FMU and AASX fixtures.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const SHELL_ID: &str = "urn:example:aas:tank";
pub const ASSET_ID: &str = "urn:example:asset:tank";
pub const SIM_SUBMODEL_ID: &str = "urn:example:sm:simulation";
pub const NAMEPLATE_ID: &str = "urn:example:sm:nameplate";
pub const CONCEPT_ID: &str = "0173-1#02-AAO677#002";

pub const MANUAL_PATH: &str = "/aasx/files/manual.pdf";
pub const UNREFERENCED_PATH: &str = "/aasx/files/unreferenced.bin";
pub const THUMBNAIL_PATH: &str = "/thumbnail.png";
pub const DATASHEET_PATH: &str = "/aasx/files/data sheet.pdf";

pub const CORE_PROPERTIES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:creator>Plant Engineering</dc:creator><dc:title>Tank</dc:title></cp:coreProperties>"#;

/// Variables of a small tank model.
pub const TANK_VARIABLES: &str = r#"
    <ScalarVariable name="der(h)" valueReference="0"><Real derivative="1"/></ScalarVariable>
    <ScalarVariable name="h" valueReference="1" causality="output" unit="m" description="Fill level"><Real/></ScalarVariable>
    <ScalarVariable name="q_in" valueReference="2" causality="input" unit="m3/s" description="Inflow"><Real start="0"/></ScalarVariable>
    <ScalarVariable name="valve_open" valueReference="3" causality="input"><Boolean start="false"/></ScalarVariable>
    <ScalarVariable name="Parameters.area" valueReference="4" causality="parameter"><Real start="2"/></ScalarVariable>
    <ScalarVariable name="ContinuousStates.h" valueReference="5"><Real/></ScalarVariable>
"#;

/// `[der(x), y(output, m), Parameters.k]`
pub const FILTER_VARIABLES: &str = r#"
    <ScalarVariable name="der(x)"><Real derivative="2"/></ScalarVariable>
    <ScalarVariable name="y" causality="output" unit="m"><Real/></ScalarVariable>
    <ScalarVariable name="Parameters.k" causality="parameter"><Real start="1"/></ScalarVariable>
"#;

pub fn model_description(variables: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="2.0" modelName="Tank" guid="{{8c4e810f-3df3-4a00-8276-176fa3c9f000}}">
  <CoSimulation modelIdentifier="Tank"/>
  <UnitDefinitions><Unit name="m"/></UnitDefinitions>
  <ModelVariables>{variables}</ModelVariables>
  <ModelStructure/>
</fmiModelDescription>
"#
    )
}

/// Zip archive bytes from `(entry name, content)` pairs.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start zip entry");
            zip.write_all(content).expect("write zip entry");
        }
        zip.finish().expect("finish zip");
    }
    buffer.into_inner()
}

pub fn fmu_bytes(variables: &str) -> Vec<u8> {
    let descriptor = model_description(variables);
    zip_bytes(&[
        ("modelDescription.xml", descriptor.as_bytes()),
        ("binaries/linux64/Tank.so", &b"\x7fELF"[..]),
    ])
}

/// Write an FMU with the given variables into `dir`.
pub fn write_fmu(dir: &Path, name: &str, variables: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, fmu_bytes(variables)).expect("write fmu");
    path
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="text/xml"/>
  <Default Extension="pdf" ContentType="application/pdf"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/aasx/aasx-origin" ContentType="text/plain"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Type="http://www.admin-shell.io/aasx/relationships/aasx-origin" Target="/aasx/aasx-origin" Id="R320e13957d794f91"/>
  <Relationship Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="/docProps/core.xml" Id="R0a5e4e4b8b6f4f4e"/>
  <Relationship Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail" Target="/thumbnail.png" Id="Rd2c1e4f5a6b7c8d9"/>
</Relationships>"#;

fn origin_rels(spec_part: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Type="http://www.admin-shell.io/aasx/relationships/aas-spec" Target="{spec_part}" Id="R6b0e4b2c1d3f4a5b"/>
</Relationships>"#
    )
}

const SPEC_RELS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Type="http://www.admin-shell.io/aasx/relationships/aas-suppl" Target="/aasx/files/manual.pdf" Id="R7c1f5c3d2e4a5b6c"/>
</Relationships>"#;

const STALE_PORTS: &str = r#"
              <aas:submodelElement>
                <aas:submodelElementCollection>
                  <aas:idShort>ports</aas:idShort>
                  <aas:kind>Instance</aas:kind>
                  <aas:ordered>true</aas:ordered>
                  <aas:allowDuplicates>false</aas:allowDuplicates>
                  <aas:value>
                    <aas:submodelElement>
                      <aas:submodelElementCollection>
                        <aas:idShort>portsConnector1</aas:idShort>
                        <aas:ordered>true</aas:ordered>
                        <aas:allowDuplicates>false</aas:allowDuplicates>
                        <aas:value>
                          <aas:submodelElement><aas:property><aas:idShort>portConName</aas:idShort><aas:valueType>string</aas:valueType><aas:value>old_signal</aas:value></aas:property></aas:submodelElement>
                        </aas:value>
                      </aas:submodelElementCollection>
                    </aas:submodelElement>
                    <aas:submodelElement>
                      <aas:submodelElementCollection>
                        <aas:idShort>portsConnector2</aas:idShort>
                        <aas:ordered>true</aas:ordered>
                        <aas:allowDuplicates>false</aas:allowDuplicates>
                        <aas:value/>
                      </aas:submodelElementCollection>
                    </aas:submodelElement>
                  </aas:value>
                </aas:submodelElementCollection>
              </aas:submodelElement>"#;

/// AAS XML environment as another tool would write it.
pub fn foreign_environment(with_stale_ports: bool) -> String {
    let ports = if with_stale_ports { STALE_PORTS } else { "" };
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<aas:aasenv xmlns:aas="http://www.admin-shell.io/aas/2/0" xmlns:IEC="http://www.admin-shell.io/IEC61360/2/0" xmlns:abac="http://www.admin-shell.io/aas/abac/2/0">
  <aas:assetAdministrationShells>
    <aas:assetAdministrationShell>
      <aas:idShort>Tank</aas:idShort>
      <aas:description><aas:langString lang="EN">Buffer tank</aas:langString></aas:description>
      <aas:identification idType="URI">{SHELL_ID}</aas:identification>
      <aas:administration><aas:version>1</aas:version><aas:revision>0</aas:revision></aas:administration>
      <aas:assetRef><aas:keys><aas:key type="Asset" local="true" idType="URI">{ASSET_ID}</aas:key></aas:keys></aas:assetRef>
      <aas:submodelRefs>
        <aas:submodelRef><aas:keys><aas:key type="Submodel" local="true" idType="URI">{SIM_SUBMODEL_ID}</aas:key></aas:keys></aas:submodelRef>
        <aas:submodelRef><aas:keys><aas:key type="Submodel" local="true" idType="URI">{NAMEPLATE_ID}</aas:key></aas:keys></aas:submodelRef>
      </aas:submodelRefs>
      <aas:conceptDictionaries/>
    </aas:assetAdministrationShell>
  </aas:assetAdministrationShells>
  <aas:assets>
    <aas:asset>
      <aas:idShort>TankAsset</aas:idShort>
      <aas:identification idType="URI">{ASSET_ID}</aas:identification>
      <aas:kind>Instance</aas:kind>
    </aas:asset>
  </aas:assets>
  <aas:submodels>
    <aas:submodel>
      <aas:idShort>SimulationModels</aas:idShort>
      <aas:identification idType="URI">{SIM_SUBMODEL_ID}</aas:identification>
      <aas:semanticId><aas:keys><aas:key type="GlobalReference" local="false" idType="IRI">https://admin-shell.io/sandbox/SimulationModels/1/0</aas:key></aas:keys></aas:semanticId>
      <aas:kind>Instance</aas:kind>
      <aas:submodelElements>
        <aas:submodelElement>
          <aas:submodelElementCollection>
            <aas:idShort>simulationModel01</aas:idShort>
            <aas:kind>Instance</aas:kind>
            <aas:ordered>true</aas:ordered>
            <aas:allowDuplicates>false</aas:allowDuplicates>
            <aas:value>
              <aas:submodelElement>
                <aas:property>
                  <aas:idShort>licenceModel</aas:idShort>
                  <aas:kind>Instance</aas:kind>
                  <aas:valueType>string</aas:valueType>
                  <aas:value>Proprietary</aas:value>
                </aas:property>
              </aas:submodelElement>
              <aas:submodelElement>
                <aas:range>
                  <aas:idShort>stepSize</aas:idShort>
                  <aas:kind>Instance</aas:kind>
                  <aas:valueType>double</aas:valueType>
                  <aas:min>0.001</aas:min>
                  <aas:max>0.1</aas:max>
                </aas:range>
              </aas:submodelElement>{ports}
            </aas:value>
          </aas:submodelElementCollection>
        </aas:submodelElement>
      </aas:submodelElements>
    </aas:submodel>
    <aas:submodel>
      <aas:idShort>Nameplate</aas:idShort>
      <aas:identification idType="URI">{NAMEPLATE_ID}</aas:identification>
      <aas:kind>Instance</aas:kind>
      <aas:submodelElements>
        <aas:submodelElement>
          <aas:property>
            <aas:idShort>ManufacturerName</aas:idShort>
            <aas:category>PARAMETER</aas:category>
            <aas:kind>Instance</aas:kind>
            <aas:semanticId><aas:keys><aas:key type="ConceptDescription" local="true" idType="IRDI">{CONCEPT_ID}</aas:key></aas:keys></aas:semanticId>
            <aas:qualifier><aas:qualifiers><aas:qualifierType>Multiplicity</aas:qualifierType></aas:qualifiers></aas:qualifier>
            <aas:valueType>langString</aas:valueType>
            <aas:value>ACME Tanks</aas:value>
          </aas:property>
        </aas:submodelElement>
        <aas:submodelElement>
          <aas:file>
            <aas:idShort>Manual</aas:idShort>
            <aas:kind>Instance</aas:kind>
            <aas:mimeType>application/pdf</aas:mimeType>
            <aas:value>{MANUAL_PATH}</aas:value>
          </aas:file>
        </aas:submodelElement>
      </aas:submodelElements>
    </aas:submodel>
  </aas:submodels>
  <aas:conceptDescriptions>
    <aas:conceptDescription>
      <aas:idShort>ManufacturerName</aas:idShort>
      <aas:identification idType="IRDI">{CONCEPT_ID}</aas:identification>
      <aas:embeddedDataSpecification>
        <aas:dataSpecificationContent>
          <aas:dataSpecificationIEC61360>
            <IEC:preferredName><IEC:langString lang="EN">Manufacturer name</IEC:langString></IEC:preferredName>
            <IEC:dataType>STRING_TRANSLATABLE</IEC:dataType>
          </aas:dataSpecificationIEC61360>
        </aas:dataSpecificationContent>
        <aas:dataSpecification><aas:keys><aas:key type="GlobalReference" local="false" idType="IRI">http://admin-shell.io/DataSpecificationTemplates/DataSpecificationIEC61360/2/0</aas:key></aas:keys></aas:dataSpecification>
      </aas:embeddedDataSpecification>
    </aas:conceptDescription>
  </aas:conceptDescriptions>
</aas:aasenv>
"#
    )
}

/// A complete package with unrelated content around the simulation model.
pub fn foreign_package(with_stale_ports: bool) -> Vec<u8> {
    let spec_part = "/aasx/Tank/Tank.aas.xml";
    let environment = foreign_environment(with_stale_ports);
    let origin_rels = origin_rels(spec_part);
    zip_bytes(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("docProps/core.xml", CORE_PROPERTIES.as_bytes()),
        ("aasx/aasx-origin", &b"Intentionally empty."[..]),
        ("aasx/_rels/aasx-origin.rels", origin_rels.as_bytes()),
        ("aasx/Tank/Tank.aas.xml", environment.as_bytes()),
        ("aasx/Tank/_rels/Tank.aas.xml.rels", SPEC_RELS.as_bytes()),
        ("aasx/files/manual.pdf", &b"%PDF-1.4 manual"[..]),
        ("aasx/files/unreferenced.bin", &[0u8, 1, 2, 3][..]),
        ("thumbnail.png", &b"\x89PNG\r\n"[..]),
    ])
}

const ENTITY: &str = r#"
        <aas:submodelElement>
          <aas:entity>
            <aas:idShort>Pump</aas:idShort>
            <aas:kind>Instance</aas:kind>
            <aas:statements>
              <aas:submodelElement>
                <aas:file>
                  <aas:idShort>Datasheet</aas:idShort>
                  <aas:kind>Instance</aas:kind>
                  <aas:mimeType>application/pdf</aas:mimeType>
                  <aas:value>/aasx/files/data sheet.pdf</aas:value>
                </aas:file>
              </aas:submodelElement>
            </aas:statements>
            <aas:entityType>SelfManagedEntity</aas:entityType>
          </aas:entity>
        </aas:submodelElement>
      "#;

const ENTITY_SPEC_RELS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Type="http://www.admin-shell.io/aasx/relationships/aas-suppl" Target="/aasx/files/manual.pdf" Id="R7c1f5c3d2e4a5b6c"/>
  <Relationship Type="http://www.admin-shell.io/aasx/relationships/aas-suppl" Target="/aasx/files/data%20sheet.pdf" Id="R8d2a6d4e3f5b6c7d"/>
</Relationships>"#;

/// The foreign package with an entity in the nameplate whose statements hold
/// a file element pointing at a second embedded document.
pub fn entity_package() -> Vec<u8> {
    let mut environment = foreign_environment(false);
    let nameplate_end = environment
        .rfind("</aas:submodelElements>")
        .expect("nameplate elements");
    environment.insert_str(nameplate_end, ENTITY);
    let origin_rels = origin_rels("/aasx/Tank/Tank.aas.xml");
    zip_bytes(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("docProps/core.xml", CORE_PROPERTIES.as_bytes()),
        ("aasx/aasx-origin", &b"Intentionally empty."[..]),
        ("aasx/_rels/aasx-origin.rels", origin_rels.as_bytes()),
        ("aasx/Tank/Tank.aas.xml", environment.as_bytes()),
        ("aasx/Tank/_rels/Tank.aas.xml.rels", ENTITY_SPEC_RELS.as_bytes()),
        ("aasx/files/manual.pdf", &b"%PDF-1.4 manual"[..]),
        ("aasx/files/data%20sheet.pdf", &b"%PDF-1.4 datasheet"[..]),
        ("thumbnail.png", &b"\x89PNG\r\n"[..]),
    ])
}

/// Targets of the `aas-suppl` relationships of every spec part in a package.
pub fn supplementary_targets(package: &[u8]) -> Vec<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(package)).expect("package is a zip archive");
    let rels_parts: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("aasx/") && name.ends_with(".rels"))
        .map(str::to_string)
        .collect();
    let mut targets = Vec::new();
    for name in rels_parts {
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut archive.by_name(&name).expect("rels entry"), &mut bytes)
            .expect("read rels");
        let rels = fmu_aasx::aasx::Relationships::parse(&bytes).expect("parse rels");
        targets.extend(
            rels.of_type(fmu_aasx::aasx::rel_types::AAS_SUPPL)
                .map(|rel| rel.target.clone()),
        );
    }
    targets
}

/// Same package, but the spec part is declared as AAS JSON.
pub fn json_package() -> Vec<u8> {
    let origin_rels = origin_rels("/aasx/Tank/Tank.aas.json");
    zip_bytes(&[
        ("[Content_Types].xml", CONTENT_TYPES.replace(
            "<Default Extension=\"png\"",
            "<Default Extension=\"json\" ContentType=\"application/json\"/><Default Extension=\"png\"",
        ).as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("aasx/aasx-origin", &b"Intentionally empty."[..]),
        ("aasx/_rels/aasx-origin.rels", origin_rels.as_bytes()),
        ("aasx/Tank/Tank.aas.json", &br#"{"assetAdministrationShells": []}"#[..]),
        ("thumbnail.png", &b"\x89PNG\r\n"[..]),
    ])
}

/// Write bytes to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
