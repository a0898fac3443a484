//! # Reconciler
//!
//! Drives the relations stored for one note toward the references its text currently makes.
//!
//! For `CREATE`/`MODIFY`:
//!
//! 1. Extract asset and note references from the file.
//! 2. Fetch the note's stored relation targets.
//! 3. Link every asset reference, then every note reference, that is not yet stored.
//! 4. For every stored target the text no longer references, look at the *target's* stored
//!    relations. If the note is still among them the relation is kept (the other side still
//!    claims it); otherwise both directions are removed.
//!
//! `DELETE` removes every stored fact with the note at either end, unconditionally.
//!
//! Individual link operations are independent: a failure is logged, recorded in the report,
//! and the pass moves on. Re-running the pass is the recovery strategy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    codec::md::ReferenceExtractor,
    error::TrackerError,
    event::{FileEvent, RelationEvent},
    query::RelationStore,
};

/// Everything one reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub note: PathBuf,
    pub event: FileEvent,
    pub changes: Vec<RelationEvent>,
}

impl ReconcileReport {
    fn new(note: &Path, event: FileEvent) -> Self {
        ReconcileReport {
            note: note.to_path_buf(),
            event,
            changes: Vec::new(),
        }
    }

    pub fn linked(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().filter_map(|c| match c {
            RelationEvent::Linked(_, other) => Some(other.as_path()),
            _ => None,
        })
    }

    pub fn unlinked(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().filter_map(|c| match c {
            RelationEvent::Unlinked(_, other) => Some(other.as_path()),
            _ => None,
        })
    }

    pub fn preserved(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().filter_map(|c| match c {
            RelationEvent::Preserved(_, other) => Some(other.as_path()),
            _ => None,
        })
    }

    pub fn failures(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, RelationEvent::Failed(..)))
            .count()
    }

    fn record(&mut self, change: RelationEvent) {
        match &change {
            RelationEvent::Failed(..) | RelationEvent::Preserved(..) => {
                tracing::warn!("{}", change)
            }
            _ => tracing::info!("{}", change),
        }
        self.changes.push(change);
    }
}

pub struct Reconciler<S> {
    store: S,
    extractor: ReferenceExtractor,
}

impl<S: RelationStore> Reconciler<S> {
    pub fn new(store: S, extractor: ReferenceExtractor) -> Self {
        Reconciler { store, extractor }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn extractor(&self) -> &ReferenceExtractor {
        &self.extractor
    }

    /// Reconcile `note_path` for `event`.
    ///
    /// Returns an error only if the pass could not start: the note could not be read, or the
    /// note's stored relations could not be fetched. Everything after that is per-item.
    #[tracing::instrument(skip(self))]
    pub fn reconcile(
        &self,
        note_path: &Path,
        event: FileEvent,
    ) -> Result<ReconcileReport, TrackerError> {
        let mut report = ReconcileReport::new(note_path, event);
        match event {
            FileEvent::Delete => self.unlink_all(note_path, &mut report)?,
            FileEvent::Create | FileEvent::Modify => {
                self.sync_references(note_path, &mut report)?
            }
        }
        Ok(report)
    }

    /// Both directions are removed for every endpoint the note points to or is pointed at by,
    /// so one-sided incoming facts go too.
    fn unlink_all(&self, note: &Path, report: &mut ReconcileReport) -> Result<(), TrackerError> {
        let mut others = self.store.related_to(note)?;
        others.extend(self.store.referrers(note)?);
        for other in others {
            let change = match self.store.remove_link(note, &other) {
                Ok(()) => RelationEvent::Unlinked(note.to_path_buf(), other),
                Err(e) => RelationEvent::Failed(note.to_path_buf(), other, e),
            };
            report.record(change);
        }
        Ok(())
    }

    fn sync_references(
        &self,
        note: &Path,
        report: &mut ReconcileReport,
    ) -> Result<(), TrackerError> {
        let refs = self.extractor.extract(note)?;
        let stored = self.store.related_to(note)?;

        for path in refs.assets.iter().chain(refs.notes.iter()) {
            if stored.contains(path) {
                continue;
            }
            let change = match self.store.add_link(note, path) {
                Ok(()) => RelationEvent::Linked(note.to_path_buf(), path.clone()),
                Err(e) => RelationEvent::Failed(note.to_path_buf(), path.clone(), e),
            };
            report.record(change);
        }

        for candidate in stored.into_iter().filter(|p| !refs.contains(p)) {
            let change = match self.store.related_to(&candidate) {
                Ok(back) if back.contains(note) => {
                    RelationEvent::Preserved(note.to_path_buf(), candidate)
                }
                Ok(_) => match self.store.remove_link(note, &candidate) {
                    Ok(()) => RelationEvent::Unlinked(note.to_path_buf(), candidate),
                    Err(e) => RelationEvent::Failed(note.to_path_buf(), candidate, e),
                },
                Err(e) => RelationEvent::Failed(note.to_path_buf(), candidate, e),
            };
            report.record(change);
        }
        Ok(())
    }
}
