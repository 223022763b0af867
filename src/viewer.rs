//! Read-only queries for browsing ingested databases.

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions recognised as databases
pub const DATABASE_EXTENSIONS: &[&str] = &["sqlite", "sqlite3", "db"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseFile {
    /// File stem, used as the display name
    pub name: String,
    pub path: PathBuf,
}

/// One row of `ViewDataStructures`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataStructureView {
    pub id: i64,
    pub name: String,
    pub source: Option<String>,
    pub channel: Option<String>,
}

/// Find database files below `root`, one per file stem
pub fn discover_databases(root: &Path) -> Result<Vec<DatabaseFile>> {
    if !root.is_dir() {
        bail!("Database path {:?} is not a directory", root);
    }

    let mut found = BTreeMap::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let is_database = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| DATABASE_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if !is_database {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            found.insert(stem.to_string_lossy().into_owned(), path.to_path_buf());
        }
    }

    Ok(found
        .into_iter()
        .map(|(name, path)| DatabaseFile { name, path })
        .collect())
}

pub fn query_data_structures(conn: &Connection) -> rusqlite::Result<Vec<DataStructureView>> {
    let mut stmt = conn.prepare(
        "SELECT Id, EngName, Source, Channel FROM ViewDataStructures ORDER BY EngName",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DataStructureView {
            id: row.get(0)?,
            name: row.get(1)?,
            source: row.get(2)?,
            channel: row.get(3)?,
        })
    })?;
    rows.collect()
}

/// Open `path` read-only and list its data structures
pub fn data_structures(path: &Path) -> Result<Vec<DataStructureView>> {
    if !path.is_file() {
        bail!("Database file not found: {:?}", path);
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database: {:?}", path))?;

    query_data_structures(&conn)
        .with_context(|| format!("Failed to query data structures in {:?}", path))
}
