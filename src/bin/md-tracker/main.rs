//! md-tracker CLI tool
//!
//! Reconciles the index relations of a single note after a lifecycle event:
//!
//! ```text
//! md-tracker ~/Vault/pages/today.md MODIFY
//! ```
//!
//! `CREATE` and `MODIFY` link the note to every asset and note it references and unlink
//! what it no longer references. `DELETE` unlinks everything.

use clap::Parser;
use md_tracker::{
    compiler::Reconciler, config::TrackerConfig, db::TrackerCli, event::FileEvent,
    query::SparqlStore, TrackerError,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "md-tracker")]
#[command(author, version, about = "Sync the index relations of one Markdown note", long_about = None)]
struct Cli {
    /// Path to the note file
    note: PathBuf,

    /// Event that happened to the note: CREATE, MODIFY or DELETE
    event: FileEvent,

    /// Configuration file path (default: $XDG_CONFIG_HOME/md-tracker/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that `../assets/<name>` references resolve against
    #[arg(long)]
    assets_root: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<(), TrackerError> {
    let mut config = TrackerConfig::load(cli.config.as_deref())?;
    if let Some(assets_root) = cli.assets_root {
        config = config.with_assets_root(assets_root);
    }

    let note = std::path::absolute(&cli.note)?;
    let store = SparqlStore::new(TrackerCli::new(config.tracker.clone()));
    let reconciler = Reconciler::new(store, config.extractor()?);

    let report = reconciler.reconcile(&note, cli.event)?;
    println!(
        "{} {}: {} linked, {} unlinked, {} kept, {} failed",
        report.event,
        report.note.display(),
        report.linked().count(),
        report.unlinked().count(),
        report.preserved().count(),
        report.failures()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        if e.is_index_error() {
            eprintln!("Check that the indexer is running and that [tracker] in the config names it.");
        }
        std::process::exit(1);
    }
}
