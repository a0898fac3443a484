//! # md-tracker
//!
//! Keeps a desktop semantic index's "related to" graph in sync with the cross-references found
//! inside a folder of Markdown notes.
//!
//! ## Overview
//!
//! When a note mentions an asset (`![img](../assets/photo.png)`) or another note (`[[Project
//! Alpha]]`, `#standup_notes`), md-tracker records a symmetric relation between the two files
//! in the index. When the mention disappears the relation is removed, unless the other side still
//! claims it. When a note is deleted, all of its relations go with it.
//!
//! ## Architecture
//!
//! - **[`query`]**: the gateway contract ([`query::RelationStore`]) and its SPARQL backend
//! - **[`db`]**: the subprocess transport to the indexer's query frontend
//! - **[`linkbase`]**: an in-memory store with the same contract
//! - **[`codec`]**: line-oriented reference extraction from note text
//! - **[`compiler`]**: the per-note reconciler
//! - **[`vault`]**: directory runs (sync, prune, remove-all, reindex, repair)
//! - **[`watch`]**: continuous watching (requires the `service` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md_tracker::{
//!     compiler::Reconciler, config::TrackerConfig, db::TrackerCli, event::FileEvent,
//!     query::SparqlStore,
//! };
//! use std::path::Path;
//!
//! let config = TrackerConfig::load(None)?;
//! let store = SparqlStore::new(TrackerCli::new(config.tracker.clone()));
//! let reconciler = Reconciler::new(store, config.extractor()?);
//!
//! let report = reconciler.reconcile(Path::new("/home/me/Vault/pages/today.md"), FileEvent::Modify)?;
//! for change in &report.changes {
//!     println!("{change}");
//! }
//! # Ok::<(), md_tracker::TrackerError>(())
//! ```
//!
//! ## Consistency
//!
//! Each relation is two directed facts written by two independent updates. A crash between
//! them leaves a one-sided fact behind; [`vault::VaultSync::repair`] finds and fixes those.
//! Every operation is idempotent, so re-running a failed pass is always safe.

pub mod codec;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod linkbase;
pub mod paths;
pub mod query;
#[cfg(test)]
mod tests;
pub mod vault;
#[cfg(feature = "service")]
pub mod watch;

pub use error::*;
