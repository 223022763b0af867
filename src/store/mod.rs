//! Persistent store: the SQLite database every ingestor merges into.
//!
//! `Store` owns the single connection for a run together with the
//! interning caches that mirror the small lookup tables. Upserts run in
//! autocommit mode, so each row is committed on its own and an interrupted
//! run never leaves a half-written row behind.

mod lookup;
pub mod rows;
pub mod schema_gen;
mod upsert;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::schema::{ReferenceData, CHANNEL_DIRECTIONS};

pub use rows::*;
pub use schema_gen::ddl_script;

/// In-memory mirrors of interned tables, keyed by natural key
#[derive(Debug, Default)]
struct InternCache {
    types: HashMap<String, i64>,
    units: HashMap<String, i64>,
    definitions: HashMap<String, i64>,
    structures: HashMap<String, i64>,
}

pub struct Store {
    conn: Connection,
    cache: InternCache,
}

impl Store {
    /// Create a new database at `path`, replacing any existing file
    pub fn create(path: &Path, ddl: &str, reference: &ReferenceData) -> Result<Self> {
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove existing database")?;
        }

        let conn = Connection::open(path).context("Failed to create database")?;
        let mut store = Self::from_connection(conn)?;
        store.create_schema(ddl).context("Failed to create schema")?;
        store
            .seed_reference(reference)
            .context("Failed to seed reference tables")?;

        info!(database = %path.display(), "Created database");
        Ok(store)
    }

    /// Open an existing database created by [`Store::create`]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("Database {:?} does not exist; run `create` first", path);
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        let mut store = Self::from_connection(conn)?;

        if !store.has_table("DataStructures")? {
            bail!("Database {:?} has no GILDA schema; run `create` first", path);
        }
        store.refresh_caches()?;

        Ok(store)
    }

    /// In-memory store with the built-in schema
    pub fn in_memory(reference: &ReferenceData) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let mut store = Self::from_connection(conn)?;
        let ddl = ddl_script().map_err(anyhow::Error::msg)?;
        store.create_schema(&ddl)?;
        store.seed_reference(reference)?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .context("Failed to configure database")?;

        Ok(Self {
            conn,
            cache: InternCache::default(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute a DDL script with foreign key enforcement relaxed
    pub fn create_schema(&mut self, ddl: &str) -> rusqlite::Result<()> {
        self.conn.pragma_update(None, "foreign_keys", false)?;
        let result = self.conn.execute_batch(ddl);
        self.conn.pragma_update(None, "foreign_keys", true)?;
        result
    }

    /// Seed the read-only reference tables
    pub fn seed_reference(&mut self, reference: &ReferenceData) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        {
            let lists: [(&str, Vec<&str>); 4] = [
                (
                    "INSERT OR IGNORE INTO PartitionList (Name) VALUES (?1)",
                    reference.partitions.iter().map(String::as_str).collect(),
                ),
                (
                    "INSERT OR IGNORE INTO Equipments (Name) VALUES (?1)",
                    reference.equipments.iter().map(String::as_str).collect(),
                ),
                (
                    "INSERT OR IGNORE INTO Modules (Name) VALUES (?1)",
                    reference.modules.iter().map(String::as_str).collect(),
                ),
                (
                    "INSERT OR IGNORE INTO ChannelDirection (Direction) VALUES (?1)",
                    CHANNEL_DIRECTIONS.to_vec(),
                ),
            ];

            for (sql, names) in lists {
                let mut stmt = tx.prepare(sql)?;
                for name in names {
                    stmt.execute([name])?;
                }
            }
        }
        tx.commit()
    }

    pub fn has_table(&self, name: &str) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count rows violating a foreign key constraint
    pub fn foreign_key_violations(&self) -> rusqlite::Result<u64> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        let mut violations = 0;
        while rows.next()?.is_some() {
            violations += 1;
        }
        Ok(violations)
    }

    /// Refresh planner statistics and reclaim free pages
    pub fn maintain(&self) -> rusqlite::Result<()> {
        debug!("Running ANALYZE/VACUUM");
        self.conn
            .execute_batch("ANALYZE; VACUUM; PRAGMA optimize;")
    }

    /// Close the connection, surfacing any error from SQLite
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .context("Failed to close database")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn reference() -> ReferenceData {
        ReferenceData {
            partitions: vec!["P1".into(), "P2".into()],
            equipments: vec!["FCU".into()],
            modules: vec!["CPM1".into()],
        }
    }

    #[test]
    fn test_in_memory_seeds_reference_tables() {
        let store = Store::in_memory(&reference()).unwrap();
        assert_eq!(store.partitions().unwrap().len(), 2);
        assert_eq!(store.equipments().unwrap().len(), 1);
        let modules: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM Modules", [], |r| r.get(0))
            .unwrap();
        assert_eq!(modules, 1);

        let directions = store.channel_directions().unwrap();
        for direction in CHANNEL_DIRECTIONS {
            assert!(directions.contains_key(*direction));
        }
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let store = Store::in_memory(&reference()).unwrap();
        let result = store.connection().execute(
            "INSERT INTO DataStructures (EngName, SourcePartition) VALUES ('X', 999)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_foreign_key_check_counts_violations() {
        let store = Store::in_memory(&reference()).unwrap();
        assert_eq!(store.foreign_key_violations().unwrap(), 0);

        store
            .connection()
            .execute_batch(
                "PRAGMA foreign_keys = OFF;
                 INSERT INTO DataStructures (EngName, SourcePartition) VALUES ('X', 999);
                 PRAGMA foreign_keys = ON;",
            )
            .unwrap();
        assert_eq!(store.foreign_key_violations().unwrap(), 1);
    }

    #[test]
    fn test_create_and_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gilda.db");
        let ddl = ddl_script().unwrap();

        Store::create(&path, &ddl, &reference())
            .unwrap()
            .close()
            .unwrap();
        let store = Store::open(&path).unwrap();
        assert!(store.has_table("ArincDiscretes").unwrap());
        store.maintain().unwrap();
    }

    #[test]
    fn test_open_rejects_missing_or_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        assert!(Store::open(&path).is_err());

        let empty = dir.path().join("empty.db");
        Connection::open(&empty)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER)")
            .unwrap();
        assert!(Store::open(&empty).is_err());
    }
}
