use once_cell::sync::Lazy;
use regex::{escape as re_escape, Regex};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::{
    config::get_content,
    error::TrackerError,
    paths::{normalize_lexically, note_dir},
};

static BRACKET_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.+?)\]\]").expect("valid regex"));
static HASH_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("valid regex"));

/// The paths a note's current text points to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub assets: BTreeSet<PathBuf>,
    pub notes: BTreeSet<PathBuf>,
}

impl References {
    pub fn contains(&self, path: &Path) -> bool {
        self.assets.contains(path) || self.notes.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assets.len() + self.notes.len()
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    assets_root: Option<PathBuf>,
    asset_prefix: String,
    asset_ref: Regex,
    note_extension: String,
}

impl ReferenceExtractor {
    /// `asset_prefix` is the literal relative prefix (`../assets/`) that marks an asset link.
    /// Without an `assets_root`, that prefix is resolved against each note's directory.
    pub fn new(
        assets_root: Option<PathBuf>,
        asset_prefix: &str,
        note_extension: &str,
    ) -> Result<Self, TrackerError> {
        // Lazy name up to a `)` that ends the line or precedes whitespace.
        let asset_ref = Regex::new(&format!(r"{}(.+?)\)(?:\s|$)", re_escape(asset_prefix)))?;
        Ok(ReferenceExtractor {
            assets_root,
            asset_prefix: asset_prefix.to_string(),
            asset_ref,
            note_extension: note_extension.to_string(),
        })
    }

    pub fn note_extension(&self) -> &str {
        &self.note_extension
    }

    /// Read `note_path` and collect its references.
    pub fn extract(&self, note_path: &Path) -> Result<References, TrackerError> {
        let content = get_content(note_path)?;
        Ok(self.extract_from_str(note_path, &content))
    }

    /// Collect references from `content` as if it were the text of `note_path`.
    ///
    /// Bracket and hash references are kept only if the resolved sibling file exists.
    pub fn extract_from_str(&self, note_path: &Path, content: &str) -> References {
        let dir = note_dir(note_path);
        let mut refs = References::default();
        for line in content.lines() {
            self.scan_line(dir, line, &mut refs);
        }
        tracing::debug!(
            "[ReferenceExtractor] {:?}: {} asset and {} note references",
            note_path,
            refs.assets.len(),
            refs.notes.len()
        );
        refs
    }

    fn scan_line(&self, dir: &Path, line: &str, refs: &mut References) {
        for caps in self.asset_ref.captures_iter(line) {
            refs.assets.insert(self.resolve_asset(dir, &caps[1]));
        }

        let named = BRACKET_REF
            .captures_iter(line)
            .chain(HASH_REF.captures_iter(line));
        for caps in named {
            let candidate = dir.join(format!("{}.{}", &caps[1], self.note_extension));
            if candidate.exists() {
                refs.notes.insert(candidate);
            } else {
                tracing::trace!("[ReferenceExtractor] no such note: {:?}", candidate);
            }
        }
    }

    fn resolve_asset(&self, dir: &Path, name: &str) -> PathBuf {
        match &self.assets_root {
            Some(root) => root.join(name),
            None => normalize_lexically(dir.join(&self.asset_prefix).join(name)),
        }
    }
}
