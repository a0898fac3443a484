//! # Directory runs
//!
//! [`VaultSync`] applies the [`Reconciler`] to a whole directory of notes and cleans up what
//! per-note passes cannot see:
//!
//! - [`VaultSync::process_directory`]: reconcile every direct child note as `CREATE`.
//! - [`VaultSync::prune_orphans`]: drop relations whose source file is gone, or whose source
//!   is a note outside the directory.
//! - [`VaultSync::remove_all`]: drop every relation sourced at a note.
//! - [`VaultSync::repair`]: complete or drop directed facts whose mirror is missing.
//!
//! All of these are sequential and best-effort: a failure on one item is logged and counted in
//! the returned [`SyncSummary`], and the run continues. Only a failure to fetch the initial
//! relation list, or a directory that is not a directory, aborts a run.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{
    commands::{SyncMode, SyncSummary},
    compiler::Reconciler,
    error::TrackerError,
    event::FileEvent,
    linkbase::asymmetric,
    paths::{has_extension, is_within},
    query::RelationStore,
};

pub struct VaultSync<S> {
    reconciler: Reconciler<S>,
}

fn ensure_dir(dir: &Path) -> Result<(), TrackerError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(TrackerError::NotADirectory(dir.to_path_buf()))
    }
}

impl<S: RelationStore> VaultSync<S> {
    pub fn new(reconciler: Reconciler<S>) -> Self {
        VaultSync { reconciler }
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    fn store(&self) -> &S {
        self.reconciler.store()
    }

    fn note_extension(&self) -> &str {
        self.reconciler.extractor().note_extension()
    }

    /// Run `mode` against `dir`.
    pub fn run(&self, dir: &Path, mode: SyncMode) -> Result<SyncSummary, TrackerError> {
        ensure_dir(dir)?;
        tracing::info!("=== {} {} ===", mode, dir.display());
        let summary = match mode {
            SyncMode::Sync => {
                let mut summary = self.process_directory(dir)?;
                summary.merge(self.prune_orphans(dir)?);
                summary
            }
            SyncMode::RemoveAll => self.remove_all()?,
            SyncMode::Reindex => {
                let mut summary = self.remove_all()?;
                summary.merge(self.process_directory(dir)?);
                summary
            }
            SyncMode::Repair => self.repair(dir)?,
        };
        tracing::info!("=== {} complete ===", mode);
        Ok(summary)
    }

    /// Direct child files of `dir` carrying the note extension, sorted by name.
    pub fn note_files(&self, dir: &Path) -> Result<Vec<PathBuf>, TrackerError> {
        ensure_dir(dir)?;
        let mut notes = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[VaultSync] skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && has_extension(path, self.note_extension()) {
                notes.push(path.to_path_buf());
            }
        }
        Ok(notes)
    }

    pub fn process_directory(&self, dir: &Path) -> Result<SyncSummary, TrackerError> {
        let mut summary = SyncSummary::default();
        for note in self.note_files(dir)? {
            tracing::info!("Processing file: {}", note.display());
            match self.reconciler.reconcile(&note, FileEvent::Create) {
                Ok(report) => {
                    summary.processed += 1;
                    summary.absorb(&report);
                }
                Err(e) => {
                    tracing::warn!("Failed to process {}: {}", note.display(), e);
                    summary.failed_files += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Remove relations that no longer belong to anything managed.
    ///
    /// Every stored source that is missing from disk, or that is a note lying outside `dir`,
    /// is reconciled as `DELETE`. Existing non-note sources such as assets are left alone.
    pub fn prune_orphans(&self, dir: &Path) -> Result<SyncSummary, TrackerError> {
        ensure_dir(dir)?;
        let relations = self.store().query_relations(None)?;
        let mut summary = SyncSummary::default();

        let sources: BTreeSet<&Path> = relations.iter().map(|r| r.source.as_path()).collect();
        for source in sources {
            if !source.exists() {
                tracing::info!("Removing links of missing file: {}", source.display());
            } else if !is_within(source, dir) && has_extension(source, self.note_extension()) {
                tracing::info!("Removing links of out-of-scope note: {}", source.display());
            } else {
                continue;
            }
            self.delete_source(source, &mut summary);
        }
        Ok(summary)
    }

    /// Reconcile every stored note source as `DELETE`, whether or not it still exists.
    pub fn remove_all(&self) -> Result<SyncSummary, TrackerError> {
        let relations = self.store().query_relations(None)?;
        let sources: BTreeSet<&Path> = relations
            .iter()
            .map(|r| r.source.as_path())
            .filter(|source| has_extension(source, self.note_extension()))
            .collect();
        let mut summary = SyncSummary::default();
        for source in sources {
            tracing::info!("Removing links of {}", source.display());
            self.delete_source(source, &mut summary);
        }
        Ok(summary)
    }

    fn delete_source(&self, source: &Path, summary: &mut SyncSummary) {
        match self.reconciler.reconcile(source, FileEvent::Delete) {
            Ok(report) => {
                summary.pruned += 1;
                summary.absorb(&report);
            }
            Err(e) => {
                tracing::warn!("Failed to DELETE {}: {}", source.display(), e);
                summary.failed_files += 1;
            }
        }
    }

    /// Fix directed facts touching `dir` whose mirror is missing.
    ///
    /// If either endpoint's text still references the other, the link is completed; otherwise
    /// the lone fact is deleted.
    pub fn repair(&self, dir: &Path) -> Result<SyncSummary, TrackerError> {
        ensure_dir(dir)?;
        let relations = self.store().query_relations(None)?;
        let mut summary = SyncSummary::default();
        for relation in asymmetric(&relations) {
            let (source, target) = (relation.source.as_path(), relation.target.as_path());
            if !is_within(source, dir) && !is_within(target, dir) {
                continue;
            }
            let result = if self.references(source, target) || self.references(target, source)
            {
                tracing::info!("Completing one-sided link: {}", relation);
                self.store().add_link(source, target)
            } else {
                tracing::info!("Dropping one-sided link: {}", relation);
                self.store().delete_relation(source, target)
            };
            match result {
                Ok(()) => summary.repaired += 1,
                Err(e) => {
                    tracing::warn!("Failed to repair {}: {}", relation, e);
                    summary.failed_links += 1;
                }
            }
        }
        Ok(summary)
    }

    /// True if `note` is an existing note whose text references `other`.
    fn references(&self, note: &Path, other: &Path) -> bool {
        if !note.is_file() || !has_extension(note, self.note_extension()) {
            return false;
        }
        match self.reconciler.extractor().extract(note) {
            Ok(refs) => refs.contains(other),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", note.display(), e);
                false
            }
        }
    }
}
