//! Natural-key upserts.
//!
//! Each statement is a single `INSERT ... ON CONFLICT DO UPDATE` keyed on the
//! table's natural key. The update list names only the columns the calling
//! ingestion path owns; nullable link columns use `COALESCE` so a path that
//! does not know a link never clears one set by another path.

use rusqlite::params;

use super::rows::*;
use super::Store;

impl Store {
    /// Insert or update a structure from the structure/field path
    pub fn upsert_structure(&mut self, row: &StructureRow) -> rusqlite::Result<i64> {
        let id: i64 = self
            .conn
            .prepare_cached(
                "INSERT INTO DataStructures (EngName, SourcePartition, Channel)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(EngName) DO UPDATE SET
                     SourcePartition = excluded.SourcePartition,
                     Channel = COALESCE(excluded.Channel, DataStructures.Channel)
                 RETURNING Id",
            )?
            .query_row(
                params![row.eng_name, row.source_partition, row.channel],
                |r| r.get(0),
            )?;
        self.cache.structures.insert(row.eng_name.clone(), id);
        Ok(id)
    }

    /// Insert or update a structure from an equipment channel list
    pub fn upsert_structure_from_equipment(
        &mut self,
        row: &EquipmentStructureRow,
    ) -> rusqlite::Result<i64> {
        let id: i64 = self
            .conn
            .prepare_cached(
                "INSERT INTO DataStructures (EngName, SourceEquipment, Channel, MonitorPoint)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(EngName) DO UPDATE SET
                     SourceEquipment = excluded.SourceEquipment,
                     Channel = COALESCE(excluded.Channel, DataStructures.Channel),
                     MonitorPoint = COALESCE(excluded.MonitorPoint, DataStructures.MonitorPoint)
                 RETURNING Id",
            )?
            .query_row(
                params![
                    row.eng_name,
                    row.source_equipment,
                    row.channel,
                    row.monitor_point
                ],
                |r| r.get(0),
            )?;
        self.cache.structures.insert(row.eng_name.clone(), id);
        Ok(id)
    }

    /// Point still-unlinked channels described as `eng_name` at the structure.
    ///
    /// Returns the number of channels linked.
    pub fn link_channels_to_structure(
        &self,
        eng_name: &str,
        structure_id: i64,
    ) -> rusqlite::Result<usize> {
        self.conn
            .prepare_cached(
                "UPDATE Channels SET DataStructure = ?1
                 WHERE Description = ?2 AND DataStructure IS NULL",
            )?
            .execute(params![structure_id, eng_name])
    }

    pub(super) fn upsert_enum_definition(
        &self,
        definition: &str,
        comment: &str,
    ) -> rusqlite::Result<i64> {
        self.conn
            .prepare_cached(
                "INSERT INTO ParameterEnumDefinitions (Definition, Comment) VALUES (?1, ?2)
                 ON CONFLICT(Definition) DO UPDATE SET Comment = excluded.Comment
                 RETURNING Id",
            )?
            .query_row(params![definition, comment], |r| r.get(0))
    }

    /// Insert or fully refresh a parameter field, returning its id
    pub fn upsert_field(&self, row: &FieldRow) -> rusqlite::Result<i64> {
        self.conn
            .prepare_cached(
                r#"INSERT INTO ParameterFields
                 (Name, RefEngName, Size, "Offset", Type, SourcePartition, DataStructure,
                  Unit, Description, Min, Max, LowBit, HighBit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(Name) DO UPDATE SET
                     RefEngName = excluded.RefEngName,
                     Size = excluded.Size,
                     "Offset" = excluded."Offset",
                     Type = excluded.Type,
                     SourcePartition = excluded.SourcePartition,
                     DataStructure = excluded.DataStructure,
                     Unit = excluded.Unit,
                     Description = excluded.Description,
                     Min = excluded.Min,
                     Max = excluded.Max,
                     LowBit = excluded.LowBit,
                     HighBit = excluded.HighBit
                 RETURNING Id"#,
            )?
            .query_row(
                params![
                    row.name,
                    row.ref_eng_name,
                    row.size,
                    row.offset,
                    row.type_id,
                    row.source_partition,
                    row.structure_id,
                    row.unit_id,
                    row.description,
                    row.min,
                    row.max,
                    row.low_bit,
                    row.high_bit
                ],
                |r| r.get(0),
            )
    }

    /// Enumeration values are replaced wholesale rather than merged
    pub fn replace_enum_value(
        &self,
        field_id: i64,
        value: i64,
        definition_id: i64,
    ) -> rusqlite::Result<()> {
        self.conn
            .prepare_cached(
                "INSERT OR REPLACE INTO ParameterEnumValues (ParameterField, Value, Definition)
                 VALUES (?1, ?2, ?3)",
            )?
            .execute(params![field_id, value, definition_id])?;
        Ok(())
    }

    pub fn upsert_channel(&self, row: &ChannelRow) -> rusqlite::Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO Channels (Id, Equipment, Module, Direction, DataStructure, Description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(Id, Equipment, Module) DO UPDATE SET
                     Direction = excluded.Direction,
                     DataStructure = COALESCE(excluded.DataStructure, Channels.DataStructure),
                     Description = excluded.Description",
            )?
            .execute(params![
                row.id,
                row.equipment,
                row.module,
                row.direction,
                row.data_structure,
                row.description
            ])?;
        Ok(())
    }

    pub fn upsert_arinc_parameter(&self, row: &ArincParameterRow) -> rusqlite::Result<i64> {
        self.conn
            .prepare_cached(
                r#"INSERT INTO ArincParameters
                 (ParameterFieldsId, Label, Name, Description, Type, "Offset", Length,
                  Unit, Min, Max, ScaleFactor)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(Label, Name, ParameterFieldsId) DO UPDATE SET
                     Description = excluded.Description,
                     Type = excluded.Type,
                     "Offset" = excluded."Offset",
                     Length = excluded.Length,
                     Unit = excluded.Unit,
                     Min = excluded.Min,
                     Max = excluded.Max,
                     ScaleFactor = excluded.ScaleFactor
                 RETURNING Id"#,
            )?
            .query_row(
                params![
                    row.parameter_field_id,
                    row.label,
                    row.name,
                    row.description,
                    row.type_id,
                    row.offset,
                    row.length,
                    row.unit_id,
                    row.min,
                    row.max,
                    row.scale_factor
                ],
                |r| r.get(0),
            )
    }

    pub fn upsert_arinc_discrete(&self, row: &ArincDiscreteRow) -> rusqlite::Result<i64> {
        self.conn
            .prepare_cached(
                r#"INSERT INTO ArincDiscretes (Value, Name, Label, "Offset", ParameterFieldsId)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(ParameterFieldsId, Label, "Offset", Value) DO UPDATE SET
                     Name = excluded.Name
                 RETURNING Id"#,
            )?
            .query_row(
                params![
                    row.value,
                    row.name,
                    row.label,
                    row.offset,
                    row.parameter_field_id
                ],
                |r| r.get(0),
            )
    }
}
