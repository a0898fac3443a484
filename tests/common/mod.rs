//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use md_tracker::{codec::ReferenceExtractor, query::QueryEngine, TrackerError};
use parking_lot::Mutex;
use regex::Regex;
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A vault on disk: `<tmp>/pages` for notes and `<tmp>/assets` for assets.
#[allow(dead_code)]
pub struct Vault {
    pub tmp: TempDir,
    pub pages: PathBuf,
    pub assets: PathBuf,
}

#[allow(dead_code)]
impl Vault {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let pages = tmp.path().join("pages");
        let assets = tmp.path().join("assets");
        fs::create_dir_all(&pages).unwrap();
        fs::create_dir_all(&assets).unwrap();
        Vault { tmp, pages, assets }
    }

    pub fn page(&self, name: &str) -> PathBuf {
        self.pages.join(format!("{name}.md"))
    }

    pub fn note(&self, name: &str, content: &str) -> PathBuf {
        let path = self.page(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn asset(&self, name: &str) -> PathBuf {
        let path = self.assets.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    pub fn extractor(&self) -> ReferenceExtractor {
        ReferenceExtractor::new(Some(self.assets.clone()), "../assets/", "md").unwrap()
    }
}

/// A toy triple store that understands exactly the query forms the gateway emits and prints
/// results the way the indexer's `sparql` frontend does.
#[allow(dead_code)]
#[derive(Default)]
pub struct TripleEngine {
    pub triples: Mutex<BTreeSet<(String, String)>>,
    pub tagged: Mutex<BTreeSet<String>>,
    pub down: Mutex<bool>,
}

#[allow(dead_code)]
impl TripleEngine {
    pub fn set_down(&self, down: bool) {
        *self.down.lock() = down;
    }

    fn check(&self) -> Result<(), TrackerError> {
        if *self.down.lock() {
            Err(TrackerError::IndexUnavailable("engine is down".to_string()))
        } else {
            Ok(())
        }
    }

    fn iris(text: &str) -> Vec<String> {
        let re = Regex::new(r"<([^>]+)>").unwrap();
        re.captures_iter(text).map(|c| c[1].to_string()).collect()
    }
}

impl QueryEngine for TripleEngine {
    fn submit_query(&self, query: &str) -> Result<String, TrackerError> {
        self.check()?;
        let triples = self.triples.lock();
        let mut out = String::from("Results:\n");
        if query.starts_with("SELECT ?file ?link") {
            for (s, t) in triples.iter() {
                out.push_str(&format!("  {s}, {t}\n"));
            }
        } else if query.starts_with("SELECT ?file WHERE") {
            let object = Self::iris(query).remove(0);
            for (s, _) in triples.iter().filter(|(_, t)| *t == object) {
                out.push_str(&format!("  {s}\n"));
            }
        } else {
            let subject = Self::iris(query).remove(0);
            for (_, t) in triples.iter().filter(|(s, _)| *s == subject) {
                out.push_str(&format!("  {t}\n"));
            }
        }
        Ok(out)
    }

    fn submit_update(&self, update: &str) -> Result<(), TrackerError> {
        self.check()?;
        let iris = Self::iris(update);
        if update.contains("a nie:InformationElement") {
            self.tagged.lock().insert(iris[0].clone());
        } else if update.starts_with("INSERT") {
            self.triples
                .lock()
                .insert((iris[0].clone(), iris[1].clone()));
        } else if update.starts_with("DELETE") {
            self.triples
                .lock()
                .remove(&(iris[0].clone(), iris[1].clone()));
        } else {
            return Err(TrackerError::IndexUnavailable(format!(
                "unsupported update: {update}"
            )));
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn is_symmetric(relations: &BTreeSet<md_tracker::query::Relation>) -> bool {
    relations.iter().all(|r| relations.contains(&r.mirror()))
}

#[allow(dead_code)]
pub fn touches(relations: &BTreeSet<md_tracker::query::Relation>, path: &Path) -> bool {
    relations
        .iter()
        .any(|r| r.source == path || r.target == path)
}
