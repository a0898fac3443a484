//! md-tracker-sync CLI tool
//!
//! Runs md-tracker over every note in a directory.
//!
//! ## Modes
//!
//! - default: reconcile every note, then prune relations of deleted or out-of-scope files
//! - `--remove-all`: drop every note relation from the index
//! - `--reindex`: `--remove-all`, then reconcile every note
//! - `--repair`: fix one-sided relations left behind by an interrupted run
//! - `--watch`: default sync, then keep reconciling as files change (requires the `service`
//!   feature)
//!
//! Per-note failures are logged and counted; the run continues. A missing directory or an
//! index that cannot be queried for the initial relation list ends the run with exit status 1.

use clap::Parser;
use md_tracker::{
    commands::{SyncMode, SyncSummary},
    compiler::Reconciler,
    config::TrackerConfig,
    db::TrackerCli,
    query::{RelationStore, SparqlStore},
    vault::VaultSync,
    TrackerError,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "md-tracker-sync")]
#[command(author, version, about = "Sync index relations for a directory of Markdown notes", long_about = None)]
struct Cli {
    /// Directory containing the notes
    directory: PathBuf,

    /// Remove every note relation from the index
    #[arg(long)]
    remove_all: bool,

    /// Remove every note relation, then reprocess the directory
    #[arg(long)]
    reindex: bool,

    /// Complete or drop relations stored in one direction only
    #[arg(long)]
    repair: bool,

    /// After syncing, keep watching the directory for changes
    #[arg(short, long)]
    watch: bool,

    /// Configuration file path (default: $XDG_CONFIG_HOME/md-tracker/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that `../assets/<name>` references resolve against
    #[arg(long)]
    assets_root: Option<PathBuf>,
}

fn print_summary(mode: SyncMode, summary: &SyncSummary) {
    println!("\n=== {mode} Results ===");
    println!("{summary}");
}

#[cfg(feature = "service")]
fn watch<S: RelationStore>(
    sync: &VaultSync<S>,
    dir: &Path,
    note_extension: &str,
) -> Result<(), TrackerError> {
    use md_tracker::watch::VaultWatcher;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    let watcher = VaultWatcher::new(dir, note_extension, std::time::Duration::from_secs(2))?;
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| TrackerError::Io(format!("could not install Ctrl-C handler: {e}")))?;

    println!("Watching {} for changes. Press Ctrl-C to stop.", dir.display());
    let summary = watcher.run(sync, &running);
    print_summary(SyncMode::Sync, &summary);
    Ok(())
}

#[cfg(not(feature = "service"))]
fn watch<S: RelationStore>(
    _sync: &VaultSync<S>,
    _dir: &Path,
    _note_extension: &str,
) -> Result<(), TrackerError> {
    Err(TrackerError::Command(
        "--watch requires md-tracker-sync built with the 'service' feature".to_string(),
    ))
}

fn run(cli: Cli) -> Result<(), TrackerError> {
    let mut config = TrackerConfig::load(cli.config.as_deref())?;
    if let Some(assets_root) = cli.assets_root {
        config = config.with_assets_root(assets_root);
    }

    let dir = std::path::absolute(&cli.directory)?;
    if !dir.is_dir() {
        return Err(TrackerError::NotADirectory(dir));
    }
    let mode = SyncMode::from_flags(cli.remove_all, cli.reindex, cli.repair);
    if cli.watch && mode != SyncMode::Sync {
        return Err(TrackerError::Command(format!(
            "--watch cannot be combined with {mode} mode"
        )));
    }

    let store = SparqlStore::new(TrackerCli::new(config.tracker.clone()));
    let sync = VaultSync::new(Reconciler::new(store, config.extractor()?));

    let summary = sync.run(&dir, mode)?;
    print_summary(mode, &summary);

    if cli.watch {
        watch(&sync, &dir, &config.note_extension)?;
    }
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
