use anyhow::{Context, Result};
use gilda_to_sqlite::{
    cli::{Cli, Commands},
    logging::{init_logging, LogConfig, LogTarget},
    orchestrator::{self, IngestOptions, RunSummary},
    schema::{DependencyResolver, ReferenceData},
    store::{ddl_script, Store},
    ui::{SilentUi, UiApp},
    viewer,
};
use std::time::Instant;
use tracing::warn;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // The terminal UI owns the screen, so console logging is off unless a file is given
    let tui = matches!(cli.command, Commands::Ingest { tui: true, .. });
    let target = match (&cli.log_file, tui) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, true) => LogTarget::Off,
        (None, false) => LogTarget::Stderr,
    };
    init_logging(&LogConfig {
        verbosity: cli.verbose,
        target,
    })?;

    match cli.command {
        Commands::Create {
            database,
            reference,
            schema,
        } => {
            let reference = match reference {
                Some(path) => ReferenceData::from_file(&path)?,
                None => {
                    warn!("No reference data given, partition/equipment/module tables stay empty");
                    ReferenceData::default()
                }
            };
            let ddl = match schema {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read schema: {:?}", path))?,
                None => ddl_script().map_err(anyhow::Error::msg)?,
            };

            Store::create(&database, &ddl, &reference)?.close()?;
            println!(
                "Created {:?} ({} partitions, {} equipments, {} modules)",
                database,
                reference.partitions.len(),
                reference.equipments.len(),
                reference.modules.len()
            );
        }

        Commands::Ingest {
            input,
            output,
            structures,
            arinc,
            vacuum,
            tui,
        } => {
            let start = Instant::now();
            let mut store = Store::open(&output)?;
            let options = IngestOptions {
                upsert_structures: structures,
                arinc_config: arinc,
                maintain: vacuum,
            };

            let summary = if tui {
                let mut ui = UiApp::new()?;
                let result = orchestrator::run(&mut store, &input, &options, &mut ui);
                match &result {
                    Ok(summary) => ui.finish(&summary_line(summary))?,
                    Err(_) => ui.restore()?,
                }
                result?
            } else {
                orchestrator::run(&mut store, &input, &options, &mut SilentUi::new())?
            };
            store.close()?;

            println!(
                "\n{} into {:?} in {:.1}s",
                summary_line(&summary),
                output,
                start.elapsed().as_secs_f64()
            );
            if !summary.is_clean() {
                for path in &summary.files_failed {
                    println!("  failed: {}", path.display());
                }
                println!("See the log for details.");
            }
        }

        Commands::Databases { root } => {
            let databases = viewer::discover_databases(&root)?;
            println!("{}", serde_json::to_string_pretty(&databases)?);
        }

        Commands::View { database } => {
            let rows = viewer::data_structures(&database)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }

        Commands::Schema { tables: false } => {
            print!("{}", ddl_script().map_err(anyhow::Error::msg)?);
        }

        Commands::Schema { tables: true } => {
            println!("Tables in creation order:\n");
            let order = DependencyResolver::new()
                .creation_order()
                .map_err(anyhow::Error::msg)?;
            for table in order {
                let kind = if table.reference { "reference" } else { "ingested" };
                let key = table
                    .natural_key()
                    .map(|columns| columns.join(", "))
                    .unwrap_or_default();
                println!("  {:<26} {:<10} key: {}", table.name, kind, key);
            }
        }
    }

    Ok(())
}

fn summary_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "Ingested {} files ({} rows, {} skipped, {} failed)",
        summary.files_processed,
        summary.rows_written,
        summary.records_skipped,
        summary.files_failed.len()
    );
    if summary.fido_failures > 0 {
        line.push_str(&format!(", {} fido files failed", summary.fido_failures));
    }
    if summary.cancelled {
        line.push_str(", cancelled");
    }
    line
}
