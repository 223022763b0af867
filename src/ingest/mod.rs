//! Ingestors: one per input grammar, each merging a file into the [`Store`].
//!
//! Ingestors never share in-memory state. Anything one of them needs from
//! another (a structure id, a FIFO field) is read back from the store.

mod arinc;
mod channels;
mod structures;

use std::path::Path;

use tracing::debug;

use crate::error::IngestError;
use crate::parser::{parse_document, Element};
use crate::store::Store;

pub use arinc::ArincIngestor;
pub use channels::ChannelIngestor;
pub use structures::StructureIngestor;

/// Counters for one ingested file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows inserted or updated
    pub rows_written: u64,
    /// Records skipped because they lacked the attributes that identify them
    pub records_skipped: u64,
    /// Secondary files that failed and were logged (ARINC fido files)
    pub failures: u64,
}

/// Common interface the orchestrator drives
pub trait Ingestor {
    /// Short name used in log lines and progress labels
    fn kind(&self) -> &'static str;

    /// Merge one input file into the store.
    ///
    /// An error means the file as a whole failed; rows committed before the
    /// failure stay in place.
    fn ingest_file(&mut self, store: &mut Store, path: &Path) -> Result<IngestReport, IngestError>;
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, IngestError> {
    std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a text file, replacing invalid UTF-8 sequences
pub(crate) fn read_text(path: &Path) -> Result<String, IngestError> {
    Ok(String::from_utf8_lossy(&read_bytes(path)?).into_owned())
}

/// Parse an XML file, decoding it with the encoding it declares
pub(crate) fn read_document(path: &Path) -> Result<Element, IngestError> {
    parse_document(read_bytes(path)?)
}

/// Fail the current file if any foreign key points at a missing row
pub(crate) fn verify_integrity(store: &Store) -> Result<(), IngestError> {
    match store.foreign_key_violations()? {
        0 => {
            debug!("Foreign key check passed");
            Ok(())
        }
        violations => Err(IngestError::Integrity { violations }),
    }
}
