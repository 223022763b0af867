//! Input discovery and the phased ingestion run.
//!
//! Phases always run in the same order: channel topology, then structures,
//! then ARINC definitions. Structures link to channels that already exist,
//! and ARINC rows hang off FIFO fields created by the structure phase.
//! Within a phase every file stands alone: a failure is logged and the run
//! moves on to the next file.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::ingest::{ArincIngestor, ChannelIngestor, IngestReport, Ingestor, StructureIngestor};
use crate::store::Store;
use crate::ui::{FileOutcome, Phase, Ui};

/// Channel topology export, matched case-insensitively
pub const CHANNELS_FILE: &str = "channels.xml";

#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Insert or update structure rows rather than only looking them up
    pub upsert_structures: bool,
    /// File name of the ARINC bus configuration to look for under the input root
    pub arinc_config: Option<String>,
    /// Run ANALYZE/VACUUM after ingestion
    pub maintain: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            upsert_structures: true,
            arinc_config: None,
            maintain: false,
        }
    }
}

/// Input files grouped by phase, each group in path order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFiles {
    pub channels: Vec<PathBuf>,
    pub structures: Vec<PathBuf>,
    pub arinc: Vec<PathBuf>,
}

impl InputFiles {
    pub fn discover(root: &Path, arinc_config: Option<&str>) -> Result<Self> {
        if !root.is_dir() {
            bail!("Input path {:?} is not a directory", root);
        }

        let mut files = Self::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.into_path();
            if arinc_config == Some(name.as_str()) {
                files.arinc.push(path);
            } else if name.eq_ignore_ascii_case(CHANNELS_FILE) {
                files.channels.push(path);
            } else if is_xml(&path) {
                files.structures.push(path);
            }
        }

        Ok(files)
    }

    pub fn total(&self) -> usize {
        self.channels.len() + self.structures.len() + self.arinc.len()
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub files_processed: u64,
    pub files_failed: Vec<PathBuf>,
    pub rows_written: u64,
    pub records_skipped: u64,
    /// Fido files that failed inside an otherwise successful ARINC pass
    pub fido_failures: u64,
    pub cancelled: bool,
}

impl RunSummary {
    fn record(&mut self, report: IngestReport) {
        self.rows_written += report.rows_written;
        self.records_skipped += report.records_skipped;
        self.fido_failures += report.failures;
    }

    pub fn is_clean(&self) -> bool {
        self.files_failed.is_empty() && self.fido_failures == 0 && !self.cancelled
    }
}

/// Ingest everything under `input` into `store`
pub fn run<U: Ui>(
    store: &mut Store,
    input: &Path,
    options: &IngestOptions,
    ui: &mut U,
) -> Result<RunSummary> {
    ui.set_phase(Phase::Discovering);
    ui.set_info(input.display().to_string());
    let files = InputFiles::discover(input, options.arinc_config.as_deref())?;
    info!(
        total = files.total(),
        channels = files.channels.len(),
        structures = files.structures.len(),
        arinc = files.arinc.len(),
        "Discovered input files"
    );

    if let Some(name) = &options.arinc_config {
        if files.arinc.is_empty() {
            warn!(config = %name, "ARINC configuration not found under input path");
        }
    }

    let mut channels = ChannelIngestor::new();
    let mut structures = StructureIngestor::new(options.upsert_structures);
    let mut arinc = ArincIngestor::new();
    let phases: [(Phase, &[PathBuf], &mut dyn Ingestor); 3] = [
        (Phase::Channels, files.channels.as_slice(), &mut channels),
        (Phase::Structures, files.structures.as_slice(), &mut structures),
        (Phase::Arinc, files.arinc.as_slice(), &mut arinc),
    ];

    let mut summary = RunSummary::default();
    for (phase, paths, ingestor) in phases {
        if !run_phase(store, phase, paths, ingestor, ui, &mut summary) {
            warn!(phase = %phase, "Run cancelled");
            summary.cancelled = true;
            return Ok(summary);
        }
    }

    if options.maintain {
        ui.set_phase(Phase::Maintenance);
        store.maintain().context("Database maintenance failed")?;
        info!("Database maintenance complete");
    }

    Ok(summary)
}

/// Returns false if the user cancelled before the phase finished
fn run_phase<U: Ui>(
    store: &mut Store,
    phase: Phase,
    paths: &[PathBuf],
    ingestor: &mut dyn Ingestor,
    ui: &mut U,
    summary: &mut RunSummary,
) -> bool {
    ui.set_phase(phase);

    for (index, path) in paths.iter().enumerate() {
        if ui.cancelled() {
            return false;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        ui.file_started(index, paths.len(), &name);

        match ingestor.ingest_file(store, path) {
            Ok(report) => {
                ui.file_finished(
                    &name,
                    FileOutcome::Ingested {
                        rows: report.rows_written,
                    },
                );
                summary.record(report);
            }
            Err(err) => {
                error!(
                    file = %path.display(),
                    kind = ingestor.kind(),
                    category = err.category(),
                    error = %err,
                    "Failed to ingest file"
                );
                ui.file_finished(&name, FileOutcome::Failed(err.to_string()));
                summary.files_failed.push(path.clone());
            }
        }
        summary.files_processed += 1;
    }

    true
}
