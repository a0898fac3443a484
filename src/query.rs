//! # Query gateway
//!
//! [`RelationStore`] is the only view the reconciler and the vault walker have of the index.
//! It speaks in filesystem paths and directed `(source, target)` facts; symmetry is layered on
//! top by [`RelationStore::add_link`] and [`RelationStore::remove_link`].
//!
//! [`SparqlStore`] implements the contract for indexers that accept a small SPARQL dialect,
//! delegating transport to a [`QueryEngine`] (see [`crate::db::TrackerCli`]). Any other backend,
//! such as the in-memory [`crate::linkbase::LinkBase`], can stand in for it.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use crate::{
    error::TrackerError,
    paths::{path_to_uri, uri_to_path, URI_SCHEME},
};

/// A directed "related to" fact as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl Relation {
    pub fn new<S: Into<PathBuf>, T: Into<PathBuf>>(source: S, target: T) -> Self {
        Relation {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn mirror(&self) -> Relation {
        Relation {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source.display(), self.target.display())
    }
}

pub trait RelationStore {
    /// Stored facts, restricted to those whose source is `source` when given.
    fn query_relations(&self, source: Option<&Path>) -> Result<BTreeSet<Relation>, TrackerError>;

    /// Mark `path` as an information-bearing entity. Idempotent.
    fn ensure_tagged(&self, path: &Path) -> Result<(), TrackerError>;

    /// Insert the directed fact `(a, b)` unless already present.
    fn insert_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError>;

    /// Delete the directed fact `(a, b)`. Absence is not an error.
    fn delete_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError>;

    /// Targets of every stored fact whose source is `path`.
    fn related_to(&self, path: &Path) -> Result<BTreeSet<PathBuf>, TrackerError> {
        Ok(self
            .query_relations(Some(path))?
            .into_iter()
            .map(|r| r.target)
            .collect())
    }

    /// Sources of every stored fact whose target is `path`.
    fn referrers(&self, path: &Path) -> Result<BTreeSet<PathBuf>, TrackerError> {
        Ok(self
            .query_relations(None)?
            .into_iter()
            .filter(|r| r.target == path)
            .map(|r| r.source)
            .collect())
    }

    fn add_link(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        tracing::debug!("[RelationStore] add_link {:?} <-> {:?}", a, b);
        self.ensure_tagged(a)?;
        self.ensure_tagged(b)?;
        self.insert_relation(a, b)?;
        self.insert_relation(b, a)
    }

    /// Delete both directions. The second delete is attempted even if the first fails; the
    /// first error is returned.
    fn remove_link(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        tracing::debug!("[RelationStore] remove_link {:?} <-> {:?}", a, b);
        let forward = self.delete_relation(a, b);
        let backward = self.delete_relation(b, a);
        forward.and(backward)
    }
}

impl<S: RelationStore + ?Sized> RelationStore for &S {
    fn query_relations(&self, source: Option<&Path>) -> Result<BTreeSet<Relation>, TrackerError> {
        (**self).query_relations(source)
    }

    fn referrers(&self, path: &Path) -> Result<BTreeSet<PathBuf>, TrackerError> {
        (**self).referrers(path)
    }

    fn ensure_tagged(&self, path: &Path) -> Result<(), TrackerError> {
        (**self).ensure_tagged(path)
    }

    fn insert_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        (**self).insert_relation(a, b)
    }

    fn delete_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        (**self).delete_relation(a, b)
    }
}

/// Raw text transport to an indexer's query frontend.
pub trait QueryEngine {
    /// Submit a read query and return its tabular text output.
    fn submit_query(&self, query: &str) -> Result<String, TrackerError>;

    /// Submit an update. Output is discarded.
    fn submit_update(&self, update: &str) -> Result<(), TrackerError>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn submit_query(&self, query: &str) -> Result<String, TrackerError> {
        (**self).submit_query(query)
    }

    fn submit_update(&self, update: &str) -> Result<(), TrackerError> {
        (**self).submit_update(update)
    }
}

/// Property linking two related entities.
pub const RELATED_TO: &str = "nie:relatedTo";
/// Class every endpoint must carry before it can be related.
pub const INFORMATION_ELEMENT: &str = "nie:InformationElement";

fn iri(path: &Path) -> String {
    format!("<{}>", path_to_uri(path))
}

/// Query text for every stored fact, or those sourced at `source`.
pub fn select_relations(source: Option<&Path>) -> String {
    match source {
        Some(source) => format!(
            "SELECT ?link WHERE {{ {} {RELATED_TO} ?link }}",
            iri(source)
        ),
        None => format!("SELECT ?file ?link WHERE {{ ?file {RELATED_TO} ?link }}"),
    }
}

/// Query text for the sources of every stored fact targeting `target`.
pub fn select_referrers(target: &Path) -> String {
    format!(
        "SELECT ?file WHERE {{ ?file {RELATED_TO} {} }}",
        iri(target)
    )
}

pub fn insert_tag(path: &Path) -> String {
    let subject = iri(path);
    format!(
        "INSERT {{ {subject} a {INFORMATION_ELEMENT} }} WHERE {{ FILTER NOT EXISTS {{ {subject} a {INFORMATION_ELEMENT} }} }}"
    )
}

pub fn insert_relation(a: &Path, b: &Path) -> String {
    let (a, b) = (iri(a), iri(b));
    format!(
        "INSERT {{ {a} {RELATED_TO} {b} }} WHERE {{ FILTER NOT EXISTS {{ {a} {RELATED_TO} {b} }} }}"
    )
}

pub fn delete_relation(a: &Path, b: &Path) -> String {
    let (a, b) = (iri(a), iri(b));
    format!("DELETE {{ {a} {RELATED_TO} {b} }} WHERE {{ {a} {RELATED_TO} {b} }}")
}

/// Decode one result line into its path fields.
///
/// Lines that do not start with the URI scheme (headers, blank lines) yield `Ok(None)`.
pub fn parse_row(line: &str, columns: usize) -> Result<Option<Vec<PathBuf>>, TrackerError> {
    let trimmed = line.trim();
    if !trimmed.starts_with(URI_SCHEME) {
        return Ok(None);
    }
    let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if fields.len() != columns {
        return Err(TrackerError::MalformedResultRow(format!(
            "expected {columns} field(s), found {} in '{trimmed}'",
            fields.len()
        )));
    }
    if let Some(field) = fields.iter().find(|f| !f.starts_with(URI_SCHEME)) {
        return Err(TrackerError::MalformedResultRow(format!(
            "'{field}' is not a {URI_SCHEME} identifier in '{trimmed}'"
        )));
    }
    fields
        .into_iter()
        .map(|field| {
            uri_to_path(field).map_err(|e| {
                TrackerError::MalformedResultRow(format!("{e} in '{trimmed}'"))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Decode every data row of a result table, skipping malformed rows.
pub fn parse_rows(output: &str, columns: usize) -> Vec<Vec<PathBuf>> {
    output
        .lines()
        .filter_map(|line| match parse_row(line, columns) {
            Ok(row) => row,
            Err(e) => {
                tracing::trace!("[parse_rows] skipping row: {}", e);
                None
            }
        })
        .collect()
}

/// [`RelationStore`] over a SPARQL-speaking [`QueryEngine`].
#[derive(Debug, Clone)]
pub struct SparqlStore<E> {
    engine: E,
}

impl<E: QueryEngine> SparqlStore<E> {
    pub fn new(engine: E) -> Self {
        SparqlStore { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: QueryEngine> RelationStore for SparqlStore<E> {
    fn query_relations(&self, source: Option<&Path>) -> Result<BTreeSet<Relation>, TrackerError> {
        let query = select_relations(source);
        tracing::trace!("[SparqlStore] {}", query);
        let output = self.engine.submit_query(&query)?;
        let relations = match source {
            Some(source) => parse_rows(&output, 1)
                .into_iter()
                .filter_map(|mut row| row.pop())
                .map(|target| Relation::new(source, target))
                .collect(),
            None => parse_rows(&output, 2)
                .into_iter()
                .filter_map(|row| match <[PathBuf; 2]>::try_from(row) {
                    Ok([s, t]) => Some(Relation::new(s, t)),
                    Err(_) => None,
                })
                .collect(),
        };
        Ok(relations)
    }

    fn referrers(&self, path: &Path) -> Result<BTreeSet<PathBuf>, TrackerError> {
        let query = select_referrers(path);
        tracing::trace!("[SparqlStore] {}", query);
        let output = self.engine.submit_query(&query)?;
        Ok(parse_rows(&output, 1)
            .into_iter()
            .filter_map(|mut row| row.pop())
            .collect())
    }

    fn ensure_tagged(&self, path: &Path) -> Result<(), TrackerError> {
        self.engine.submit_update(&insert_tag(path))
    }

    fn insert_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        self.engine.submit_update(&insert_relation(a, b))
    }

    fn delete_relation(&self, a: &Path, b: &Path) -> Result<(), TrackerError> {
        self.engine.submit_update(&delete_relation(a, b))
    }
}
