//! ARINC-429 bus definitions.
//!
//! The bus configuration maps each FIFO parameter field (by name) to a fido
//! file next to it. Fido files are read line by line with a running label
//! and offset: discrete lines describe bit patterns of the parameter most
//! recently defined. A broken fido file is logged and skipped; the other
//! buses are still ingested.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::{read_text, verify_integrity, IngestReport, Ingestor};
use crate::error::IngestError;
use crate::parser::fido::{
    arinc_type, normalize_unit, parse_bus_line, parse_discrete, parse_min_max, FidoLine,
    FidoRecord,
};
use crate::parser::{parse_integer, parse_optional_real};
use crate::store::{ArincDiscreteRow, ArincParameterRow, Store};

/// A FIFO field together with the fido file that defines its bus
#[derive(Debug, Clone, PartialEq)]
pub struct BusAssignment {
    pub bus: String,
    pub parameter_field_id: i64,
    pub fido_file: PathBuf,
}

/// Position within a fido file, reset for every file
#[derive(Debug, Clone, Copy, Default)]
struct ParseState {
    label: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Default)]
pub struct ArincIngestor;

impl ArincIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Pair FIFO fields with the fido files named in a bus configuration.
    ///
    /// Fido paths are resolved against `base`. Later lines for the same bus
    /// win; buses with no FIFO field are ignored.
    pub fn assign_buses(
        config: &str,
        fifo_fields: &BTreeMap<String, i64>,
        base: &Path,
    ) -> Vec<BusAssignment> {
        let mut files: BTreeMap<&str, &str> = BTreeMap::new();
        for entry in config.lines().filter_map(parse_bus_line) {
            if fifo_fields.contains_key(entry.bus) {
                files.insert(entry.bus, entry.fido_file);
            } else {
                debug!(bus = entry.bus, "Bus has no FIFO field, skipping");
            }
        }

        fifo_fields
            .iter()
            .filter_map(|(bus, field_id)| match files.get(bus.as_str()) {
                Some(file) if !file.is_empty() => Some(BusAssignment {
                    bus: bus.clone(),
                    parameter_field_id: *field_id,
                    fido_file: base.join(file),
                }),
                _ => {
                    debug!(bus = %bus, "No fido file configured");
                    None
                }
            })
            .collect()
    }

    /// Ingest one fido file for the FIFO field `parameter_field_id`
    pub fn ingest_fido(
        &mut self,
        store: &mut Store,
        path: &Path,
        parameter_field_id: i64,
    ) -> Result<u64, IngestError> {
        let text = read_text(path)?;
        let mut state = ParseState::default();
        let mut written = 0;

        for (index, line) in text.lines().enumerate() {
            let Some(fields) = FidoLine::split(line) else {
                continue;
            };
            let line_number = index + 1;

            if fields.opens_label {
                state.label = Some(parse_integer("ARINC label", fields.label)?);
            }

            match fields.record() {
                FidoRecord::Parameter => {
                    let label = state.label.ok_or_else(|| IngestError::Malformed {
                        line: line_number,
                        message: format!("parameter '{}' appears before any label", fields.name),
                    })?;
                    let row = parameter_row(store, &fields, label, parameter_field_id)?;
                    store.upsert_arinc_parameter(&row)?;
                    state.offset = Some(row.offset);
                    written += 1;
                }
                FidoRecord::Discrete => {
                    let (Some(label), Some(offset)) = (state.label, state.offset) else {
                        return Err(IngestError::Malformed {
                            line: line_number,
                            message: format!(
                                "discrete '{}' appears before any parameter",
                                fields.description
                            ),
                        });
                    };
                    let (value, name) = parse_discrete(fields.description)?;
                    store.upsert_arinc_discrete(&ArincDiscreteRow {
                        parameter_field_id,
                        label,
                        offset,
                        value,
                        name: name.to_string(),
                    })?;
                    written += 1;
                }
                FidoRecord::Blank => {}
            }
        }

        Ok(written)
    }
}

impl Ingestor for ArincIngestor {
    fn kind(&self) -> &'static str {
        "arinc"
    }

    fn ingest_file(&mut self, store: &mut Store, path: &Path) -> Result<IngestReport, IngestError> {
        store.refresh_caches()?;
        let mut report = IngestReport::default();

        let fifo_fields = store.fifo_parameter_fields()?;
        if fifo_fields.is_empty() {
            warn!(file = %path.display(), "No FIFO parameter fields in database, nothing to do");
            return Ok(report);
        }

        let config = read_text(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let assignments = Self::assign_buses(&config, &fifo_fields, base);

        for assignment in &assignments {
            match self.ingest_fido(store, &assignment.fido_file, assignment.parameter_field_id) {
                Ok(written) => {
                    debug!(
                        bus = %assignment.bus,
                        file = %assignment.fido_file.display(),
                        rows = written,
                        "Ingested fido file"
                    );
                    report.rows_written += written;
                }
                Err(err) => {
                    error!(
                        bus = %assignment.bus,
                        file = %assignment.fido_file.display(),
                        category = err.category(),
                        error = %err,
                        "Failed to ingest fido file"
                    );
                    report.failures += 1;
                }
            }
        }

        verify_integrity(store)?;
        info!(
            file = %path.display(),
            buses = assignments.len(),
            rows = report.rows_written,
            failures = report.failures,
            "Ingested ARINC definitions"
        );
        Ok(report)
    }
}

fn parameter_row(
    store: &mut Store,
    fields: &FidoLine<'_>,
    label: i64,
    parameter_field_id: i64,
) -> Result<ArincParameterRow, IngestError> {
    let type_id = match fields.type_token {
        "" => None,
        token => Some(store.intern_type(arinc_type(token)?)?),
    };
    let unit_id = match fields.unit {
        "" => None,
        token => Some(store.intern_unit(normalize_unit(token))?),
    };
    let (min, max) = parse_min_max(fields.min_max)?;

    Ok(ArincParameterRow {
        parameter_field_id,
        label,
        name: fields.name.to_string(),
        description: Some(fields.description)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        type_id,
        offset: parse_integer("ARINC offset", fields.offset)?,
        length: parse_integer("ARINC length", fields.length)?,
        unit_id,
        min,
        max,
        scale_factor: parse_optional_real("scale factor", fields.scale)?,
    })
}
