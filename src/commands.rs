use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{compiler::ReconcileReport, event::RelationEvent};

/// What a directory run does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Reconcile every note in the directory, then prune orphaned relations.
    #[default]
    Sync,
    /// Drop every relation sourced at a note, wherever it lives.
    RemoveAll,
    /// `RemoveAll`, then reconcile every note in the directory.
    Reindex,
    /// Complete or drop directed facts whose mirror is missing.
    Repair,
}

impl SyncMode {
    /// Resolve command-line flags. `remove_all` wins over `reindex`, which wins over `repair`.
    pub fn from_flags(remove_all: bool, reindex: bool, repair: bool) -> Self {
        if remove_all {
            SyncMode::RemoveAll
        } else if reindex {
            SyncMode::Reindex
        } else if repair {
            SyncMode::Repair
        } else {
            SyncMode::Sync
        }
    }
}

impl Display for SyncMode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SyncMode::Sync => write!(f, "Sync"),
            SyncMode::RemoveAll => write!(f, "RemoveAll"),
            SyncMode::Reindex => write!(f, "Reindex"),
            SyncMode::Repair => write!(f, "Repair"),
        }
    }
}

/// Counters accumulated over a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Notes reconciled without a fatal error.
    pub processed: usize,
    /// Notes whose reconciliation could not start (unreadable file, index down).
    pub failed_files: usize,
    /// Individual link operations that failed and were skipped.
    pub failed_links: usize,
    pub linked: usize,
    pub unlinked: usize,
    pub preserved: usize,
    pub pruned: usize,
    pub repaired: usize,
}

impl SyncSummary {
    pub fn absorb(&mut self, report: &ReconcileReport) {
        for change in &report.changes {
            match change {
                RelationEvent::Linked(..) => self.linked += 1,
                RelationEvent::Unlinked(..) => self.unlinked += 1,
                RelationEvent::Preserved(..) => self.preserved += 1,
                RelationEvent::Failed(..) => self.failed_links += 1,
            }
        }
    }

    pub fn merge(&mut self, other: SyncSummary) {
        self.processed += other.processed;
        self.failed_files += other.failed_files;
        self.failed_links += other.failed_links;
        self.linked += other.linked;
        self.unlinked += other.unlinked;
        self.preserved += other.preserved;
        self.pruned += other.pruned;
        self.repaired += other.repaired;
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files > 0 || self.failed_links > 0
    }
}

impl Display for SyncSummary {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        writeln!(f, "Processed: {}", self.processed)?;
        writeln!(f, "Linked: {}", self.linked)?;
        writeln!(f, "Unlinked: {}", self.unlinked)?;
        writeln!(f, "Preserved: {}", self.preserved)?;
        writeln!(f, "Pruned: {}", self.pruned)?;
        writeln!(f, "Repaired: {}", self.repaired)?;
        write!(
            f,
            "Failures: {} file(s), {} link(s)",
            self.failed_files, self.failed_links
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FileEvent;
    use std::path::PathBuf;

    #[test]
    fn flag_precedence() {
        assert_eq!(SyncMode::from_flags(false, false, false), SyncMode::Sync);
        assert_eq!(SyncMode::from_flags(true, true, true), SyncMode::RemoveAll);
        assert_eq!(SyncMode::from_flags(false, true, true), SyncMode::Reindex);
        assert_eq!(SyncMode::from_flags(false, false, true), SyncMode::Repair);
    }

    #[test]
    fn absorb_counts_each_change_kind() {
        let a = PathBuf::from("/v/a.md");
        let b = PathBuf::from("/v/b.md");
        let report = ReconcileReport {
            note: a.clone(),
            event: FileEvent::Modify,
            changes: vec![
                RelationEvent::Linked(a.clone(), b.clone()),
                RelationEvent::Preserved(a.clone(), b.clone()),
                RelationEvent::Failed(
                    a.clone(),
                    b.clone(),
                    crate::TrackerError::IndexUnavailable("down".into()),
                ),
            ],
        };
        let mut summary = SyncSummary::default();
        summary.absorb(&report);
        assert_eq!(summary.linked, 1);
        assert_eq!(summary.preserved, 1);
        assert_eq!(summary.failed_links, 1);
        assert!(summary.has_failures());

        let mut total = SyncSummary {
            processed: 2,
            ..Default::default()
        };
        total.merge(summary);
        assert_eq!(total.processed, 2);
        assert_eq!(total.linked, 1);
    }
}
