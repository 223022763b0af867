use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gilda-to-sqlite")]
#[command(version, about = "Merge GILDA configuration exports into a SQLite database")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new database, overwriting an existing file
    Create {
        /// Output SQLite database path
        database: PathBuf,

        /// JSON file listing partitions, equipments and modules
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// DDL script to use instead of the built-in schema
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Ingest GILDA exports from a directory into an existing database
    Ingest {
        /// Directory containing GILDA export files
        input: PathBuf,

        /// SQLite database created with `create`
        output: PathBuf,

        /// Insert or update data structures (required for an empty database)
        #[arg(short, long)]
        structures: bool,

        /// File name of the ARINC bus configuration to ingest
        #[arg(short, long, env = "GILDA_ARINC_CONFIG")]
        arinc: Option<String>,

        /// Run ANALYZE and VACUUM when done
        #[arg(long)]
        vacuum: bool,

        /// Show a terminal progress UI
        #[arg(long)]
        tui: bool,
    },

    /// List database files below a directory as JSON
    Databases {
        /// Directory to search
        root: PathBuf,
    },

    /// Print the data structures of a database as JSON
    View {
        /// SQLite database path
        database: PathBuf,
    },

    /// Print the built-in schema DDL
    Schema {
        /// List tables in creation order with their natural keys instead
        #[arg(long)]
        tables: bool,
    },
}

impl Cli {
    /// Parse arguments; usage errors exit with status 1, help and version with 0
    pub fn parse_args() -> Self {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(err) => {
                let code = if err.use_stderr() { 1 } else { 0 };
                err.print().ok();
                std::process::exit(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ingest_flags() {
        let cli = Cli::try_parse_from([
            "gilda-to-sqlite",
            "-v",
            "ingest",
            "exports",
            "gilda.db",
            "-s",
            "-a",
            "arinc.cfg",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ingest {
                structures,
                arinc,
                vacuum,
                ..
            } => {
                assert!(structures);
                assert_eq!(arinc.as_deref(), Some("arinc.cfg"));
                assert!(!vacuum);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_ingest_requires_both_paths() {
        let err = Cli::try_parse_from(["gilda-to-sqlite", "ingest", "exports"]).unwrap_err();
        assert!(err.use_stderr());
    }
}
