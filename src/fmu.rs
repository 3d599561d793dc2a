//! Scalar variable extraction from an FMU's `modelDescription.xml`.
//!
//! Only the variable list is read; the rest of the FMU is not validated.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use zip::ZipArchive;

use crate::error::AasxError;

/// Fixed name of the descriptor inside the FMU archive.
pub const MODEL_DESCRIPTION: &str = "modelDescription.xml";

/// Name prefixes of derivative and solver-internal variables.
pub const EXCLUDED_PREFIXES: &[&str] = &["der(", "ContinuousStates.", "Parameters."];

/// One interface variable of a simulation component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScalarVariable {
    pub name: String,
    /// Tag of the type child (`Real`, `Integer`, ...).
    pub declared_type: String,
    pub causality: String,
    pub unit: String,
    pub description: String,
    pub prefix: String,
    pub range: String,
}

/// Whether a variable with this name is dropped during extraction.
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Read the interface variables of an FMU file.
pub fn parse_model_variables(path: &Path) -> Result<Vec<ScalarVariable>, AasxError> {
    let bytes = std::fs::read(path).map_err(|e| AasxError::from(e).in_archive(path))?;
    let descriptor = read_descriptor(&bytes).map_err(|e| e.in_archive(path))?;
    let variables = parse_model_description(&descriptor).map_err(|e| e.in_archive(path))?;
    tracing::debug!(
        "Extracted {} variables from {}",
        variables.len(),
        path.display()
    );
    Ok(variables)
}

/// Pull `modelDescription.xml` out of FMU archive bytes.
pub fn read_descriptor(fmu: &[u8]) -> Result<Vec<u8>, AasxError> {
    let mut archive = ZipArchive::new(Cursor::new(fmu))
        .map_err(|e| AasxError::corrupt(format!("not an FMU archive: {e}")))?;
    let mut file = archive
        .by_name(MODEL_DESCRIPTION)
        .map_err(|_| AasxError::corrupt(format!("{MODEL_DESCRIPTION} not found in archive")))?;
    let mut descriptor = Vec::new();
    file.read_to_end(&mut descriptor)
        .map_err(|e| AasxError::corrupt(format!("Failed to read {MODEL_DESCRIPTION}: {e}")))?;
    Ok(descriptor)
}

/// Variable being read, until its end tag.
struct Pending {
    variable: ScalarVariable,
    excluded: bool,
}

/// Extract the variables from descriptor bytes, in document order.
pub fn parse_model_description(input: &[u8]) -> Result<Vec<ScalarVariable>, AasxError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut variables = Vec::new();
    let mut depth = 0usize;
    let mut in_model_variables = false;
    let mut seen_model_variables = false;
    let mut pending: Option<Pending> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            AasxError::malformed(format!(
                "XML parse error at position {}: {e}",
                reader.error_position()
            ))
        })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                depth += 1;
                let local = local_name(e)?;

                match depth {
                    2 if local == "ModelVariables" => {
                        in_model_variables = !is_empty;
                        seen_model_variables = true;
                    }
                    3 if in_model_variables && local == "ScalarVariable" => {
                        let started = start_variable(e)?;
                        if is_empty {
                            finish(started, &mut variables)?;
                        } else {
                            pending = Some(started);
                        }
                    }
                    4 => {
                        if let Some(p) = pending.as_mut() {
                            if p.variable.declared_type.is_empty() {
                                p.variable.declared_type = local;
                            }
                        }
                    }
                    _ => {}
                }

                if is_empty {
                    depth -= 1;
                }
            }
            Event::End(_) => {
                match depth {
                    2 => in_model_variables = false,
                    3 => {
                        if let Some(p) = pending.take() {
                            finish(p, &mut variables)?;
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_model_variables {
        return Err(AasxError::malformed("ModelVariables element not found"));
    }
    Ok(variables)
}

fn start_variable(e: &BytesStart<'_>) -> Result<Pending, AasxError> {
    let name = attribute(e, "name")?.unwrap_or_default();
    if name.is_empty() {
        return Err(AasxError::malformed("ScalarVariable without a name"));
    }
    let excluded = is_excluded(&name);
    let variable = ScalarVariable {
        causality: attribute(e, "causality")?.unwrap_or_default(),
        unit: attribute(e, "unit")?.unwrap_or_default(),
        description: attribute(e, "description")?.unwrap_or_default(),
        prefix: attribute(e, "prefix")?.unwrap_or_default(),
        range: attribute(e, "range")?.unwrap_or_default(),
        declared_type: String::new(),
        name,
    };
    Ok(Pending { variable, excluded })
}

fn finish(pending: Pending, variables: &mut Vec<ScalarVariable>) -> Result<(), AasxError> {
    if pending.excluded {
        tracing::trace!("Skipping internal variable {}", pending.variable.name);
        return Ok(());
    }
    if pending.variable.declared_type.is_empty() {
        return Err(AasxError::malformed(format!(
            "ScalarVariable {} has no type element",
            pending.variable.name
        )));
    }
    variables.push(pending.variable);
    Ok(())
}

fn local_name(e: &BytesStart<'_>) -> Result<String, AasxError> {
    std::str::from_utf8(e.local_name().as_ref())
        .map(str::to_string)
        .map_err(|err| AasxError::malformed(format!("Invalid tag name: {err}")))
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, AasxError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| AasxError::malformed(format!("Attribute error: {err}")))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| AasxError::malformed(format!("Attribute value error: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
