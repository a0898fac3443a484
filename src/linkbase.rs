//! In-memory [`RelationStore`].
//!
//! `LinkBase` holds directed facts and tagged entities behind a mutex so it can be shared
//! by reference the same way the subprocess-backed store is. It is what the test suite runs
//! the reconciler against, and it doubles as a dry-run backend.

use parking_lot::Mutex;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::{
    error::TrackerError,
    query::{Relation, RelationStore},
};

#[derive(Debug, Default)]
pub struct LinkBase {
    relations: Mutex<BTreeSet<Relation>>,
    tagged: Mutex<BTreeSet<PathBuf>>,
}

impl LinkBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_relations<I: IntoIterator<Item = Relation>>(relations: I) -> Self {
        LinkBase {
            relations: Mutex::new(relations.into_iter().collect()),
            tagged: Mutex::new(BTreeSet::new()),
        }
    }

    /// Snapshot of every stored directed fact.
    pub fn relations(&self) -> BTreeSet<Relation> {
        self.relations.lock().clone()
    }

    pub fn contains(&self, a: &Path, b: &Path) -> bool {
        self.relations.lock().contains(&Relation::new(a, b))
    }

    pub fn is_tagged(&self, path: &Path) -> bool {
        self.tagged.lock().contains(path)
    }

    /// Facts whose mirror is missing.
    pub fn asymmetric(&self) -> Vec<Relation> {
        asymmetric(&self.relations.lock())
    }

    /// Every fact that has `path` as either endpoint.
    pub fn touching(&self, path: &Path) -> Vec<Relation> {
        self.relations
            .lock()
            .iter()
            .filter(|r| r.source == path || r.target == path)
            .cloned()
            .collect()
    }
}

/// Facts in `relations` whose mirror is not also present.
pub fn asymmetric(relations: &BTreeSet<Relation>) -> Vec<Relation> {
    relations
        .iter()
        .filter(|r| !relations.contains(&r.mirror()))
        .cloned()
        .collect()
}

impl RelationStore for LinkBase {
    fn query_relations(&self, source: Option<&Path>) -> Result<BTreeSet<Relation>, TrackerError> {
        let relations = self.relations.lock();
        Ok(match source {
            Some(source) => relations
                .iter()
                .filter(|r| r.source == source)
                .cloned()
                .collect(),
            None => relations.clone(),
        })
    }

    fn referrers(&self, path: &Path) -> Result<BTreeSet<PathBuf>, TrackerError> {
        Ok(self
            .relations
            .lock()
            .iter()
            .filter(|r| r.target == path)
            .map(|r| r.source.clone())
            .collect())
    }

    fn ensure_tagged(&self, path: &Path) -> Result<(), TrackerError> {
        self.tagged.lock().insert(path.to_path_buf());
        Ok(())
    }

    fn insert_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        self.relations.lock().insert(Relation::new(a, b));
        Ok(())
    }

    fn delete_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        self.relations.lock().remove(&Relation::new(a, b));
        Ok(())
    }
}
