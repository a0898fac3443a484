//! # Watch mode
//!
//! [`VaultWatcher`] turns filesystem notifications for one directory into [`FileEvent`]s and
//! feeds them to a [`VaultSync`] one at a time, on the calling thread, until asked to stop.
//!
//! The debouncer runs on its own thread and only forwards `(path, event)` pairs over a
//! channel; all index traffic stays sequential.
//!
//! ```rust,no_run
//! use md_tracker::{
//!     compiler::Reconciler, config::TrackerConfig, db::TrackerCli, query::SparqlStore,
//!     vault::VaultSync, watch::VaultWatcher,
//! };
//! use std::{path::Path, sync::atomic::AtomicBool, time::Duration};
//!
//! let config = TrackerConfig::load(None)?;
//! let store = SparqlStore::new(TrackerCli::new(config.tracker.clone()));
//! let sync = VaultSync::new(Reconciler::new(store, config.extractor()?));
//! let watcher = VaultWatcher::new(Path::new("/home/me/Vault/pages"), "md", Duration::from_secs(2))?;
//! let running = AtomicBool::new(true);
//! let summary = watcher.run(&sync, &running);
//! println!("{summary}");
//! # Ok::<(), md_tracker::TrackerError>(())
//! ```

use notify_debouncer_full::{
    new_debouncer,
    notify::{event::ModifyKind, EventKind, RecommendedWatcher, RecursiveMode, Watcher},
    DebounceEventResult, Debouncer, FileIdMap,
};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError},
    },
    time::Duration,
};

use crate::{
    commands::SyncSummary, error::TrackerError, event::FileEvent, paths::has_extension,
    query::RelationStore, vault::VaultSync,
};

/// How often [`VaultWatcher::run`] checks its stop flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

type DirWatcher = Debouncer<RecommendedWatcher, FileIdMap>;

/// Map a notification for `path` to the event the reconciler should see.
///
/// Modifications and renames are judged by whether the file is still there afterwards.
pub fn classify(kind: &EventKind, path: &Path) -> Option<FileEvent> {
    match kind {
        EventKind::Create(_) => Some(FileEvent::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(if path.exists() {
            FileEvent::Create
        } else {
            FileEvent::Delete
        }),
        EventKind::Modify(_) => Some(if path.exists() {
            FileEvent::Modify
        } else {
            FileEvent::Delete
        }),
        EventKind::Remove(_) => Some(FileEvent::Delete),
        _ => None,
    }
}

fn is_watched_note(path: &Path, note_extension: &str) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false);
    !hidden && has_extension(path, note_extension)
}

pub struct VaultWatcher {
    dir: PathBuf,
    rx: Receiver<(PathBuf, FileEvent)>,
    _debouncer: DirWatcher,
}

impl VaultWatcher {
    /// Start watching the direct children of `dir` with the given debounce window.
    pub fn new(dir: &Path, note_extension: &str, debounce: Duration) -> Result<Self, TrackerError> {
        if !dir.is_dir() {
            return Err(TrackerError::NotADirectory(dir.to_path_buf()));
        }
        let (tx, rx) = channel();
        let extension = note_extension.to_string();
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events.iter() {
                        for path in event.paths.iter() {
                            if !is_watched_note(path, &extension) {
                                continue;
                            }
                            if let Some(file_event) = classify(&event.event.kind, path) {
                                tracing::debug!("[VaultWatcher] {} {:?}", file_event, path);
                                if tx.send((path.clone(), file_event)).is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
                Err(errors) => {
                    tracing::error!("Notify debouncer returned errors: {:?}", errors);
                }
            }
        })?;
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)?;
        Ok(VaultWatcher {
            dir: dir.to_path_buf(),
            rx,
            _debouncer: debouncer,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait up to `timeout` for the next note event.
    pub fn next_event(&self, timeout: Duration) -> Result<Option<(PathBuf, FileEvent)>, TrackerError> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Ok(Some(item)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TrackerError::Io(
                "file watcher channel closed".to_string(),
            )),
        }
    }

    /// Reconcile incoming events until `running` is cleared or the watcher dies.
    pub fn run<S: RelationStore>(&self, sync: &VaultSync<S>, running: &AtomicBool) -> SyncSummary {
        tracing::info!("Watching {} for changes", self.dir.display());
        let mut summary = SyncSummary::default();
        while running.load(Ordering::SeqCst) {
            let (path, event) = match self.next_event(POLL_INTERVAL) {
                Ok(Some(item)) => item,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("{}", e);
                    break;
                }
            };
            match sync.reconciler().reconcile(&path, event) {
                Ok(report) => {
                    summary.processed += 1;
                    summary.absorb(&report);
                }
                Err(e) => {
                    tracing::warn!("Failed to process {} {}: {}", event, path.display(), e);
                    summary.failed_files += 1;
                }
            }
        }
        summary
    }
}
