//! Structure/field/enumeration XML.
//!
//! A document may hold an `EquipementList` of monitored structures and any
//! number of `Structure` records. Each `Field` carries either one
//! `NonEnumerate` definition or a set of `Enumerate` value/definition pairs,
//! never both.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use super::{read_document, verify_integrity, IngestReport, Ingestor};
use crate::error::IngestError;
use crate::parser::{decode_binary_i64, parse_hex, parse_integer, parse_optional_real, Element};
use crate::store::{EquipmentStructureRow, FieldRow, Store, StructureRow};

const ENUM_TYPE: &str = "enum";
const ENUM_UNIT: &str = "unitless";

pub struct StructureIngestor {
    upsert_structures: bool,
}

impl StructureIngestor {
    /// With `upsert_structures` off, structures must already exist and only
    /// their fields are written.
    pub fn new(upsert_structures: bool) -> Self {
        Self { upsert_structures }
    }

    pub fn ingest_document(
        &mut self,
        store: &mut Store,
        document: &Element,
    ) -> Result<IngestReport, IngestError> {
        store.refresh_caches()?;
        let mut report = IngestReport::default();

        if let Some(list) = document.first("EquipementList") {
            if self.upsert_structures {
                self.ingest_equipment_list(store, list, &mut report)?;
            } else {
                debug!("Structure upserts disabled, ignoring equipment list");
            }
        }

        let partitions = store.partitions()?;
        for structure in document.descendants("Structure") {
            let (Some(eng_name), Some(partition)) =
                (structure.attr("EngName"), structure.attr("EmittedByPartition"))
            else {
                report.records_skipped += 1;
                continue;
            };

            let partition = *partitions
                .get(partition)
                .ok_or_else(|| IngestError::lookup("partition", partition))?;
            let structure_id = self.resolve_structure(store, eng_name, partition, &mut report)?;

            for field in structure.descendants("Field") {
                if !field.has_attr("Name") {
                    report.records_skipped += 1;
                    continue;
                }
                ingest_field(store, field, structure_id, partition, &mut report)?;
            }
        }

        Ok(report)
    }

    fn ingest_equipment_list(
        &self,
        store: &mut Store,
        list: &Element,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        let equipments: HashMap<String, i64> = store.equipments()?;

        for equipment in list.descendants("Equipement") {
            let name = equipment.require_attr("Name")?;
            let equipment_id = *equipments
                .get(name)
                .ok_or_else(|| IngestError::lookup("equipment", name))?;

            for channel in equipment.descendants("Channel") {
                let row = EquipmentStructureRow {
                    eng_name: channel.require_attr("DataStructure")?.to_string(),
                    source_equipment: equipment_id,
                    channel: channel
                        .attr("ID")
                        .map(|id| parse_integer("channel id", id))
                        .transpose()?,
                    monitor_point: channel
                        .attr("MonitorPoint")
                        .map(|mp| parse_hex("monitor point", mp))
                        .transpose()?,
                };
                store.upsert_structure_from_equipment(&row)?;
                report.rows_written += 1;
            }
        }

        Ok(())
    }

    fn resolve_structure(
        &self,
        store: &mut Store,
        eng_name: &str,
        partition: i64,
        report: &mut IngestReport,
    ) -> Result<i64, IngestError> {
        if !self.upsert_structures {
            return store
                .structure_id(eng_name)?
                .ok_or_else(|| IngestError::lookup("data structure", eng_name));
        }

        let row = StructureRow {
            eng_name: eng_name.to_string(),
            source_partition: partition,
            channel: store.channel_for_description(eng_name)?,
        };
        let structure_id = store.upsert_structure(&row)?;
        report.rows_written += 1;

        let linked = store.link_channels_to_structure(eng_name, structure_id)?;
        if linked > 0 {
            debug!(structure = eng_name, channels = linked, "Linked channels");
        }
        Ok(structure_id)
    }
}

impl Default for StructureIngestor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Ingestor for StructureIngestor {
    fn kind(&self) -> &'static str {
        "structures"
    }

    fn ingest_file(&mut self, store: &mut Store, path: &Path) -> Result<IngestReport, IngestError> {
        let document = read_document(path)?;
        let report = self.ingest_document(store, &document)?;
        verify_integrity(store)?;

        info!(
            file = %path.display(),
            rows = report.rows_written,
            skipped = report.records_skipped,
            "Ingested structures"
        );
        Ok(report)
    }
}

fn bit_range(field: &Element) -> Result<(Option<i64>, Option<i64>), IngestError> {
    let Some(bits) = field.first("BitField") else {
        return Ok((None, None));
    };
    match (bits.attr("LowBit"), bits.attr("HighBit")) {
        (Some(low), Some(high)) => Ok((
            Some(parse_integer("low bit", low)?),
            Some(parse_integer("high bit", high)?),
        )),
        _ => Ok((None, None)),
    }
}

fn ingest_field(
    store: &mut Store,
    field: &Element,
    structure_id: i64,
    partition: i64,
    report: &mut IngestReport,
) -> Result<(), IngestError> {
    let name = field.require_attr("Name")?;
    let non_enumerated = field.first("NonEnumerate");
    let enumerated = field.descendants("Enumerate");

    if non_enumerated.is_some() && !enumerated.is_empty() {
        return Err(IngestError::ExclusiveRepresentation {
            field: name.to_string(),
        });
    }

    let (low_bit, high_bit) = bit_range(field)?;
    let mut row = FieldRow {
        name: name.to_string(),
        ref_eng_name: None,
        size: parse_integer("field size", field.require_attr("Size")?)?,
        offset: parse_integer("field offset", field.require_attr("Offset")?)?,
        type_id: None,
        source_partition: partition,
        structure_id,
        unit_id: None,
        description: field.attr("Description").map(str::to_string),
        min: None,
        max: None,
        low_bit,
        high_bit,
    };

    if let Some(definition) = non_enumerated {
        row.type_id = definition
            .attr("Type")
            .map(|t| store.intern_type(t))
            .transpose()?;
        row.unit_id = definition
            .attr("Unit")
            .map(|u| store.intern_unit(u))
            .transpose()?;
        row.ref_eng_name = definition.attr("RefEngName").map(str::to_string);

        if let Some(domain) = definition.first("UsageDomain") {
            if let (Some(min), Some(max)) = (domain.attr("Min"), domain.attr("Max")) {
                row.min = parse_optional_real("usage domain minimum", min)?;
                row.max = parse_optional_real("usage domain maximum", max)?;
            }
        }

        store.upsert_field(&row)?;
        report.rows_written += 1;
        return Ok(());
    }

    if enumerated.is_empty() {
        debug!(field = name, "Field has no definition, skipping");
        report.records_skipped += 1;
        return Ok(());
    }

    row.type_id = Some(store.intern_type(ENUM_TYPE)?);
    row.unit_id = Some(store.intern_unit(ENUM_UNIT)?);
    let field_id = store.upsert_field(&row)?;
    report.rows_written += 1;

    for entry in enumerated {
        let (Some(value), Some(definition)) = (entry.attr("Value"), entry.attr("Definition"))
        else {
            report.records_skipped += 1;
            continue;
        };
        let value = decode_binary_i64(value)?;
        let comment = entry.attr("Comments").unwrap_or("");
        let definition_id = store.intern_enum_definition(definition, comment)?;
        store.replace_enum_value(field_id, value, definition_id)?;
        report.rows_written += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{count, store};
    use super::*;
    use crate::parser::parse_document;

    const ALT: &str = r#"
        <Export>
          <Structure EngName="ALT" EmittedByPartition="P1">
            <Field Name="ALT_VAL" Size="32" Offset="0" Description="Altitude">
              <NonEnumerate Type="float" Unit="ft" RefEngName="ALTITUDE">
                <UsageDomain Min="0" Max="50000"/>
              </NonEnumerate>
            </Field>
          </Structure>
        </Export>"#;

    fn ingest(store: &mut Store, xml: &str) -> Result<IngestReport, IngestError> {
        let document = parse_document(xml).unwrap();
        StructureIngestor::default().ingest_document(store, &document)
    }

    #[test]
    fn test_non_enumerated_field() {
        let mut store = store();
        let report = ingest(&mut store, ALT).unwrap();
        assert_eq!(report.rows_written, 2);

        assert_eq!(count(&store, "DataStructures"), 1);
        assert_eq!(count(&store, "ParameterTypes"), 1);
        assert_eq!(count(&store, "ParameterUnits"), 1);
        assert_eq!(count(&store, "ParameterFields"), 1);

        let (min, max, ref_name): (f64, f64, String) = store
            .connection()
            .query_row(
                "SELECT Min, Max, RefEngName FROM ParameterFields WHERE Name = 'ALT_VAL'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((min, max), (0.0, 50000.0));
        assert_eq!(ref_name, "ALTITUDE");
    }

    #[test]
    fn test_enumerated_field_and_bit_range() {
        let mut store = store();
        ingest(
            &mut store,
            r#"<Structure EngName="MODE" EmittedByPartition="P2">
                 <Field Name="MODE_SEL" Size="8" Offset="4">
                   <BitField LowBit="0" HighBit="1"/>
                   <Enumerate Value="00" Definition="OFF"/>
                   <Enumerate Value="01" Definition="ON" Comments="engaged"/>
                   <Enumerate Value="11" Definition="FAULT"/>
                 </Field>
               </Structure>"#,
        )
        .unwrap();

        assert_eq!(count(&store, "ParameterEnumValues"), 3);
        assert_eq!(count(&store, "ParameterEnumDefinitions"), 3);

        let (low, high, unit): (i64, i64, String) = store
            .connection()
            .query_row(
                "SELECT f.LowBit, f.HighBit, u.Unit FROM ParameterFields f
                 JOIN ParameterUnits u ON u.Id = f.Unit",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((low, high), (0, 1));
        assert_eq!(unit, "unitless");

        let fault: i64 = store
            .connection()
            .query_row(
                "SELECT v.Value FROM ParameterEnumValues v
                 JOIN ParameterEnumDefinitions d ON d.Id = v.Definition
                 WHERE d.Definition = 'FAULT'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(fault, 3);
    }

    #[test]
    fn test_both_representations_are_rejected() {
        let mut store = store();
        let err = ingest(
            &mut store,
            r#"<Structure EngName="BAD" EmittedByPartition="P1">
                 <Field Name="BOTH" Size="1" Offset="0">
                   <NonEnumerate Type="bool" Unit="unitless"/>
                   <Enumerate Value="1" Definition="TRUE"/>
                 </Field>
               </Structure>"#,
        )
        .unwrap_err();

        assert!(matches!(err, IngestError::ExclusiveRepresentation { ref field } if field == "BOTH"));
        assert_eq!(count(&store, "ParameterFields"), 0);
        assert_eq!(count(&store, "ParameterEnumValues"), 0);
    }

    #[test]
    fn test_invalid_enum_literal_is_fatal() {
        let mut store = store();
        let err = ingest(
            &mut store,
            r#"<Structure EngName="S" EmittedByPartition="P1">
                 <Field Name="F" Size="1" Offset="0">
                   <Enumerate Value="12" Definition="TWELVE"/>
                 </Field>
               </Structure>"#,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::InvalidBinary { .. }));
        assert_eq!(count(&store, "ParameterEnumValues"), 0);
    }

    #[test]
    fn test_unknown_partition_is_a_lookup_error() {
        let mut store = store();
        let err = ingest(
            &mut store,
            r#"<Structure EngName="S" EmittedByPartition="P9"/>"#,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Lookup { kind: "partition", .. }));
    }

    #[test]
    fn test_reingestion_is_idempotent() {
        let mut store = store();
        ingest(&mut store, ALT).unwrap();
        ingest(&mut store, ALT).unwrap();

        assert_eq!(count(&store, "DataStructures"), 1);
        assert_eq!(count(&store, "ParameterFields"), 1);
        assert_eq!(count(&store, "ParameterTypes"), 1);
    }

    #[test]
    fn test_lookup_mode_requires_existing_structure() {
        let mut store = store();
        let document = parse_document(ALT).unwrap();
        let err = StructureIngestor::new(false)
            .ingest_document(&mut store, &document)
            .unwrap_err();
        assert!(matches!(err, IngestError::Lookup { kind: "data structure", .. }));

        ingest(&mut store, ALT).unwrap();
        let report = StructureIngestor::new(false)
            .ingest_document(&mut store, &document)
            .unwrap();
        assert_eq!(report.rows_written, 1);
    }

    #[test]
    fn test_equipment_list_structures() {
        let mut store = store();
        ingest(
            &mut store,
            r#"<Export>
                 <EquipementList>
                   <Equipement Name="IOM">
                     <Channel DataStructure="ALT" ID="12" MonitorPoint="1F"/>
                   </Equipement>
                 </EquipementList>
               </Export>"#,
        )
        .unwrap();
        ingest(&mut store, ALT).unwrap();

        let (equipment, partition, channel, monitor): (String, String, i64, i64) = store
            .connection()
            .query_row(
                "SELECT e.Name, p.Name, ds.Channel, ds.MonitorPoint FROM DataStructures ds
                 JOIN Equipments e ON e.Id = ds.SourceEquipment
                 JOIN PartitionList p ON p.Id = ds.SourcePartition",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(equipment, "IOM");
        assert_eq!(partition, "P1");
        assert_eq!((channel, monitor), (12, 31));
    }

    #[test]
    fn test_latin1_export_keeps_accented_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temperature.xml");
        let mut xml = br#"<?xml version="1.0" encoding="ISO-8859-1"?>
            <Export>
              <Structure EngName="TEMP" EmittedByPartition="P1">
                <Field Name="TEMP_VAL" Size="16" Offset="0" Description="Temp"#
            .to_vec();
        xml.push(0xE9);
        xml.extend_from_slice(
            br#"rature">
                  <NonEnumerate Type="int" Unit="degC"/>
                </Field>
              </Structure>
            </Export>"#,
        );
        std::fs::write(&path, xml).unwrap();

        let mut store = store();
        StructureIngestor::default()
            .ingest_file(&mut store, &path)
            .unwrap();

        let description: String = store
            .connection()
            .query_row(
                "SELECT Description FROM ParameterFields WHERE Name = 'TEMP_VAL'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(description, "Température");
    }

    #[test]
    fn test_records_without_identity_are_skipped() {
        let mut store = store();
        let report = ingest(
            &mut store,
            r#"<Export>
                 <Structure EngName="NOPART"/>
                 <Structure EngName="S" EmittedByPartition="P1">
                   <Field Size="1" Offset="0"/>
                   <Field Name="EMPTY" Size="1" Offset="0"/>
                 </Structure>
               </Export>"#,
        )
        .unwrap();
        assert_eq!(report.records_skipped, 3);
        assert_eq!(count(&store, "ParameterFields"), 0);
    }
}
