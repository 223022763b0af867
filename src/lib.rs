pub mod cli;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod orchestrator;
pub mod parser;
pub mod schema;
pub mod store;
pub mod ui;
pub mod viewer;

pub use cli::{Cli, Commands};
pub use error::IngestError;
pub use orchestrator::{IngestOptions, RunSummary};
pub use store::Store;
pub use ui::{FileOutcome, Phase, SilentUi, Ui, UiApp};
