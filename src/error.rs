//! Error taxonomy shared by the ingestors.
//!
//! Every variant is fatal for the file being processed. The orchestrator
//! catches it at the file boundary, logs it with the file name and moves on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A required reference row or mapping is absent
    #[error("{kind} '{name}' not found in database")]
    Lookup { kind: &'static str, name: String },

    #[error("field '{field}' has both Enumerate and NonEnumerate definitions")]
    ExclusiveRepresentation { field: String },

    #[error("'{value}' is not a valid binary string")]
    InvalidBinary { value: String },

    #[error("invalid {what}: '{value}'")]
    InvalidValue { what: &'static str, value: String },

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("referential integrity check reported {violations} violation(s)")]
    Integrity { violations: u64 },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("malformed document: {0}")]
    InvalidDocument(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl IngestError {
    pub fn lookup(kind: &'static str, name: impl Into<String>) -> Self {
        IngestError::Lookup {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(what: &'static str, value: impl Into<String>) -> Self {
        IngestError::InvalidValue {
            what,
            value: value.into(),
        }
    }

    /// Coarse category used in log lines
    pub fn category(&self) -> &'static str {
        match self {
            IngestError::Lookup { .. } => "lookup",
            IngestError::ExclusiveRepresentation { .. }
            | IngestError::InvalidBinary { .. }
            | IngestError::InvalidValue { .. }
            | IngestError::MissingAttribute { .. }
            | IngestError::Integrity { .. } => "validation",
            IngestError::Io { .. } => "io",
            IngestError::Malformed { .. }
            | IngestError::InvalidDocument(_)
            | IngestError::Xml(_) => "parse",
            IngestError::Database(_) => "database",
        }
    }
}
