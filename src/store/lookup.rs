//! Lookups and interning.
//!
//! Small reference tables come back as `name -> id` maps that callers load
//! once per file. Interned tables (types, units, enum definitions) go through
//! the store's cache: a miss inserts the row and records the new id.

use rusqlite::{Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};

use super::Store;

fn name_map(conn: &Connection, sql: &str) -> rusqlite::Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

fn intern(
    conn: &Connection,
    cache: &mut HashMap<String, i64>,
    sql: &str,
    value: &str,
) -> rusqlite::Result<i64> {
    if let Some(id) = cache.get(value) {
        return Ok(*id);
    }
    let id = conn.prepare_cached(sql)?.query_row([value], |row| row.get(0))?;
    cache.insert(value.to_string(), id);
    Ok(id)
}

impl Store {
    pub fn partitions(&self) -> rusqlite::Result<HashMap<String, i64>> {
        name_map(&self.conn, "SELECT Name, Id FROM PartitionList")
    }

    pub fn equipments(&self) -> rusqlite::Result<HashMap<String, i64>> {
        name_map(&self.conn, "SELECT Name, Id FROM Equipments")
    }

    pub fn channel_directions(&self) -> rusqlite::Result<HashMap<String, i64>> {
        name_map(&self.conn, "SELECT Direction, Id FROM ChannelDirection")
    }

    pub fn parameter_types(&self) -> rusqlite::Result<HashMap<String, i64>> {
        name_map(&self.conn, "SELECT Type, Id FROM ParameterTypes")
    }

    pub fn parameter_units(&self) -> rusqlite::Result<HashMap<String, i64>> {
        name_map(&self.conn, "SELECT Unit, Id FROM ParameterUnits")
    }

    pub fn enum_definitions(&self) -> rusqlite::Result<HashMap<String, i64>> {
        name_map(&self.conn, "SELECT Definition, Id FROM ParameterEnumDefinitions")
    }

    /// Reload interned tables from the database and forget cached structures.
    ///
    /// Ingestors call this whenever they start a new file.
    pub fn refresh_caches(&mut self) -> rusqlite::Result<()> {
        self.cache.types = self.parameter_types()?;
        self.cache.units = self.parameter_units()?;
        self.cache.definitions = self.enum_definitions()?;
        self.cache.structures.clear();
        Ok(())
    }

    pub fn intern_type(&mut self, name: &str) -> rusqlite::Result<i64> {
        intern(
            &self.conn,
            &mut self.cache.types,
            "INSERT INTO ParameterTypes (Type) VALUES (?1)
             ON CONFLICT(Type) DO UPDATE SET Type = excluded.Type
             RETURNING Id",
            name,
        )
    }

    pub fn intern_unit(&mut self, name: &str) -> rusqlite::Result<i64> {
        intern(
            &self.conn,
            &mut self.cache.units,
            "INSERT INTO ParameterUnits (Unit) VALUES (?1)
             ON CONFLICT(Unit) DO UPDATE SET Unit = excluded.Unit
             RETURNING Id",
            name,
        )
    }

    /// Look up an enum definition, inserting it with `comment` on a miss.
    ///
    /// A miss on a definition that exists in the database (inserted after
    /// the cache was loaded) refreshes its comment.
    pub fn intern_enum_definition(
        &mut self,
        definition: &str,
        comment: &str,
    ) -> rusqlite::Result<i64> {
        if let Some(id) = self.cache.definitions.get(definition) {
            return Ok(*id);
        }
        let id = self.upsert_enum_definition(definition, comment)?;
        self.cache.definitions.insert(definition.to_string(), id);
        Ok(id)
    }

    /// Id of the structure named `eng_name`, if it has been ingested
    pub fn structure_id(&mut self, eng_name: &str) -> rusqlite::Result<Option<i64>> {
        if let Some(id) = self.cache.structures.get(eng_name) {
            return Ok(Some(*id));
        }
        let id: Option<i64> = self
            .conn
            .prepare_cached("SELECT Id FROM DataStructures WHERE EngName = ?1")?
            .query_row([eng_name], |row| row.get(0))
            .optional()?;
        if let Some(id) = id {
            self.cache.structures.insert(eng_name.to_string(), id);
        }
        Ok(id)
    }

    /// Resolve an `(equipment, module)` pair; `None` if either is unknown
    pub fn equipment_module_ids(
        &self,
        equipment: &str,
        module: &str,
    ) -> rusqlite::Result<Option<(i64, i64)>> {
        let equipment_id: Option<i64> = self
            .conn
            .prepare_cached("SELECT Id FROM Equipments WHERE Name = ?1")?
            .query_row([equipment], |row| row.get(0))
            .optional()?;
        let module_id: Option<i64> = self
            .conn
            .prepare_cached("SELECT Id FROM Modules WHERE Name = ?1")?
            .query_row([module], |row| row.get(0))
            .optional()?;
        Ok(equipment_id.zip(module_id))
    }

    /// Numeric id of the first channel whose description equals `description`
    pub fn channel_for_description(&self, description: &str) -> rusqlite::Result<Option<i64>> {
        self.conn
            .prepare_cached(
                "SELECT Id FROM Channels WHERE Description = ?1
                 ORDER BY Equipment, Module, Id LIMIT 1",
            )?
            .query_row([description], |row| row.get(0))
            .optional()
    }

    /// Parameter fields typed `FIFO`, keyed by field name (the bus identifier)
    pub fn fifo_parameter_fields(&self) -> rusqlite::Result<BTreeMap<String, i64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT f.Name, f.Id FROM ParameterFields f
             JOIN ParameterTypes t ON t.Id = f.Type
             WHERE upper(t.Type) = 'FIFO'",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::reference;
    use super::*;

    #[test]
    fn test_intern_type_is_idempotent() {
        let mut store = Store::in_memory(&reference()).unwrap();
        let first = store.intern_type("float").unwrap();
        let second = store.intern_type("float").unwrap();
        assert_eq!(first, second);

        // A fresh cache still resolves to the stored row
        store.refresh_caches().unwrap();
        assert_eq!(store.intern_type("float").unwrap(), first);
        assert_eq!(store.parameter_types().unwrap().len(), 1);
    }

    #[test]
    fn test_intern_sees_rows_inserted_behind_the_cache() {
        let mut store = Store::in_memory(&reference()).unwrap();
        store.refresh_caches().unwrap();
        store
            .connection()
            .execute("INSERT INTO ParameterUnits (Unit) VALUES ('ft')", [])
            .unwrap();

        let id = store.intern_unit("ft").unwrap();
        assert_eq!(store.parameter_units().unwrap()["ft"], id);
        assert_eq!(store.parameter_units().unwrap().len(), 1);
    }

    #[test]
    fn test_intern_enum_definition_updates_comment_on_miss() {
        let mut store = Store::in_memory(&reference()).unwrap();
        let id = store.intern_enum_definition("ON", "").unwrap();
        store.refresh_caches().unwrap();
        store.cache.definitions.clear();

        assert_eq!(store.intern_enum_definition("ON", "engaged").unwrap(), id);
        let comment: String = store
            .connection()
            .query_row(
                "SELECT Comment FROM ParameterEnumDefinitions WHERE Id = ?1",
                [id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(comment, "engaged");
    }

    #[test]
    fn test_equipment_module_ids() {
        let store = Store::in_memory(&reference()).unwrap();
        assert!(store.equipment_module_ids("FCU", "CPM1").unwrap().is_some());
        assert!(store.equipment_module_ids("FCU", "NOPE").unwrap().is_none());
        assert!(store.equipment_module_ids("NOPE", "CPM1").unwrap().is_none());
    }

    #[test]
    fn test_structure_id_misses_are_not_cached() {
        let mut store = Store::in_memory(&reference()).unwrap();
        assert_eq!(store.structure_id("ALT").unwrap(), None);

        let partition = store.partitions().unwrap()["P1"];
        store
            .connection()
            .execute(
                "INSERT INTO DataStructures (EngName, SourcePartition) VALUES ('ALT', ?1)",
                [partition],
            )
            .unwrap();
        assert!(store.structure_id("ALT").unwrap().is_some());
    }
}
