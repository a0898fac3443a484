//! Shared test utilities: a throwaway vault on disk and a store that fails on demand.

use crate::{
    codec::md::ReferenceExtractor,
    error::TrackerError,
    linkbase::LinkBase,
    query::{Relation, RelationStore},
};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// `<tmp>/pages` holds notes, `<tmp>/assets` holds assets.
pub struct TestVault {
    tmp: TempDir,
    pages: PathBuf,
    assets: PathBuf,
}

impl TestVault {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let pages = tmp.path().join("pages");
        let assets = tmp.path().join("assets");
        fs::create_dir_all(&pages).unwrap();
        fs::create_dir_all(&assets).unwrap();
        TestVault { tmp, pages, assets }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn pages(&self) -> &Path {
        &self.pages
    }

    /// Path of note `name` in the pages directory, whether or not it exists.
    pub fn page(&self, name: &str) -> PathBuf {
        self.pages.join(format!("{name}.md"))
    }

    /// Write note `name` and return its path.
    pub fn note(&self, name: &str, content: &str) -> PathBuf {
        let path = self.page(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Path of asset `name`, created empty if absent.
    pub fn asset(&self, name: &str) -> PathBuf {
        let path = self.assets.join(name);
        if !path.exists() {
            fs::write(&path, b"").unwrap();
        }
        path
    }

    pub fn extractor(&self) -> ReferenceExtractor {
        ReferenceExtractor::new(Some(self.assets.clone()), "../assets/", "md").unwrap()
    }
}

/// A [`LinkBase`] whose inserts touching `fail_on` are rejected as if the index were down.
pub struct FlakyStore {
    pub inner: LinkBase,
    fail_on: PathBuf,
}

impl FlakyStore {
    pub fn failing_inserts_to(fail_on: PathBuf) -> Self {
        FlakyStore {
            inner: LinkBase::new(),
            fail_on,
        }
    }
}

impl RelationStore for FlakyStore {
    fn query_relations(&self, source: Option<&Path>) -> Result<BTreeSet<Relation>, TrackerError> {
        self.inner.query_relations(source)
    }

    fn ensure_tagged(&self, path: &Path) -> Result<(), TrackerError> {
        self.inner.ensure_tagged(path)
    }

    fn insert_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        if a == self.fail_on || b == self.fail_on {
            return Err(TrackerError::IndexUnavailable(format!(
                "refusing insert touching {:?}",
                self.fail_on
            )));
        }
        self.inner.insert_relation(a, b)
    }

    fn delete_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        self.inner.delete_relation(a, b)
    }
}
