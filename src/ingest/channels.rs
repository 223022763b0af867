//! Channel topology XML (`channels.xml`).
//!
//! `Equipment_Channels/Module/{From,To,Inter}Partition` nodes become rows in
//! `Channels`, keyed by `(Id, Equipment, Module)`.

use std::path::Path;

use tracing::{debug, info};

use super::{read_document, verify_integrity, IngestReport, Ingestor};
use crate::error::IngestError;
use crate::parser::{parse_integer, Element};
use crate::store::{ChannelRow, Store};

/// Node tag and the `ChannelDirection` row it maps to
const DIRECTION_TAGS: &[(&str, &str)] = &[
    ("FromPartition", "From"),
    ("ToPartition", "To"),
    ("InterPartition", "Inter"),
];

#[derive(Debug, Default)]
pub struct ChannelIngestor;

impl ChannelIngestor {
    pub fn new() -> Self {
        Self
    }

    pub fn ingest_document(
        &mut self,
        store: &mut Store,
        document: &Element,
    ) -> Result<IngestReport, IngestError> {
        store.refresh_caches()?;
        let directions = store.channel_directions()?;
        let mut report = IngestReport::default();

        for equipment in document.descendants("Equipment_Channels") {
            let equipment_name = equipment.require_attr("Name")?;

            for module in equipment.descendants("Module") {
                let module_name = module.require_attr("Name")?;
                let (equipment_id, module_id) = store
                    .equipment_module_ids(equipment_name, module_name)?
                    .ok_or_else(|| {
                        IngestError::lookup(
                            "equipment/module",
                            format!("{}/{}", equipment_name, module_name),
                        )
                    })?;

                for (tag, direction) in DIRECTION_TAGS {
                    let direction_id = *directions
                        .get(*direction)
                        .ok_or_else(|| IngestError::lookup("channel direction", *direction))?;

                    for node in module.descendants(tag) {
                        let description = node.attr("Description").unwrap_or_default();
                        let row = ChannelRow {
                            id: channel_number(node.require_attr("ChannelName")?)?,
                            equipment: equipment_id,
                            module: module_id,
                            direction: direction_id,
                            data_structure: resolve_structure(store, description)?,
                            description: description.to_string(),
                        };
                        store.upsert_channel(&row)?;
                        report.rows_written += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

impl Ingestor for ChannelIngestor {
    fn kind(&self) -> &'static str {
        "channels"
    }

    fn ingest_file(&mut self, store: &mut Store, path: &Path) -> Result<IngestReport, IngestError> {
        let document = read_document(path)?;
        let report = self.ingest_document(store, &document)?;
        verify_integrity(store)?;

        info!(file = %path.display(), rows = report.rows_written, "Ingested channels");
        Ok(report)
    }
}

/// Numeric channel id from a name such as `CH_12`
fn channel_number(name: &str) -> Result<i64, IngestError> {
    let (_, id) = name
        .rsplit_once('_')
        .ok_or_else(|| IngestError::invalid("channel name", name))?;
    parse_integer("channel id", id)
}

/// Structure described by a channel; unknown structures leave the link empty
fn resolve_structure(store: &mut Store, description: &str) -> Result<Option<i64>, IngestError> {
    if description.is_empty() {
        return Ok(None);
    }
    let id = store.structure_id(description)?;
    if id.is_none() {
        debug!(structure = description, "Structure not ingested yet, channel left unlinked");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{count, store};
    use super::*;
    use crate::parser::parse_document;
    use crate::store::StructureRow;

    const CHANNELS: &str = r#"
        <Channels>
          <Equipment_Channels Name="FCU">
            <Module Name="CPM1">
              <FromPartition ChannelName="CH_1" Description="ALT"/>
              <ToPartition ChannelName="CH_2" Description=""/>
              <InterPartition ChannelName="LINK_A_3"/>
            </Module>
          </Equipment_Channels>
        </Channels>"#;

    fn ingest(store: &mut Store, xml: &str) -> Result<IngestReport, IngestError> {
        let document = parse_document(xml).unwrap();
        ChannelIngestor::new().ingest_document(store, &document)
    }

    fn linked(store: &Store, id: i64) -> Option<i64> {
        store
            .connection()
            .query_row("SELECT DataStructure FROM Channels WHERE Id = ?1", [id], |r| {
                r.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_channel_number() {
        assert_eq!(channel_number("CH_12").unwrap(), 12);
        assert_eq!(channel_number("A_B_7").unwrap(), 7);
        assert!(channel_number("CH12").is_err());
        assert!(channel_number("CH_X").is_err());
    }

    #[test]
    fn test_channels_without_structures() {
        let mut store = store();
        let report = ingest(&mut store, CHANNELS).unwrap();
        assert_eq!(report.rows_written, 3);
        assert_eq!(count(&store, "Channels"), 3);
        assert_eq!(linked(&store, 1), None);

        let direction: String = store
            .connection()
            .query_row(
                "SELECT d.Direction FROM Channels c JOIN ChannelDirection d ON d.Id = c.Direction
                 WHERE c.Id = 3",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(direction, "Inter");
    }

    #[test]
    fn test_channel_links_existing_structure() {
        let mut store = store();
        let partition = store.partitions().unwrap()["P1"];
        let structure_id = store
            .upsert_structure(&StructureRow {
                eng_name: "ALT".into(),
                source_partition: partition,
                channel: None,
            })
            .unwrap();

        ingest(&mut store, CHANNELS).unwrap();
        assert_eq!(linked(&store, 1), Some(structure_id));
        assert_eq!(linked(&store, 2), None);
    }

    #[test]
    fn test_unknown_module_is_a_lookup_error() {
        let mut store = store();
        let err = ingest(
            &mut store,
            r#"<Equipment_Channels Name="FCU">
                 <Module Name="CPM9"><FromPartition ChannelName="CH_1"/></Module>
               </Equipment_Channels>"#,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Lookup { kind: "equipment/module", .. }));
        assert_eq!(count(&store, "Channels"), 0);
    }

    #[test]
    fn test_reingestion_is_idempotent() {
        let mut store = store();
        ingest(&mut store, CHANNELS).unwrap();
        ingest(&mut store, CHANNELS).unwrap();
        assert_eq!(count(&store, "Channels"), 3);
    }
}
