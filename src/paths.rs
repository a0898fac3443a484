//! Path helpers shared by the gateway, the extractor and the vault walker.
//!
//! Index identifiers are `file://` URIs whose path part is percent-encoded in full, separators
//! included (`/home/me/a b.md` becomes `file://%2Fhome%2Fme%2Fa%20b.md`). Conversion in both
//! directions lives here so that nothing above the gateway ever sees a URI.

use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
};

use crate::error::TrackerError;

/// Scheme prefix used for every identifier written to or read from the index.
pub const URI_SCHEME: &str = "file://";

/// Render a path as a (lossy) UTF-8 string.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    os_path_ref.as_ref().to_string_lossy().into_owned()
}

/// Encode a filesystem path as an index identifier.
pub fn path_to_uri<P: AsRef<Path>>(path: P) -> String {
    let encoded = urlencoding::encode(&os_path_to_string(path)).into_owned();
    format!("{URI_SCHEME}{encoded}")
}

/// Decode an index identifier back into a filesystem path.
///
/// The scheme prefix is optional so that bare, already-stripped fields decode as well.
pub fn uri_to_path(uri: &str) -> Result<PathBuf, TrackerError> {
    let raw = uri.trim();
    let raw = raw.strip_prefix(URI_SCHEME).unwrap_or(raw);
    if raw.is_empty() {
        return Err(TrackerError::MalformedResultRow(format!(
            "empty identifier in '{uri}'"
        )));
    }
    let decoded: Cow<'_, str> = urlencoding::decode(raw)?;
    Ok(PathBuf::from(decoded.into_owned()))
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// A `..` that would climb above the root (or above the start of a relative path) is kept
/// as-is for relative paths and dropped for absolute ones.
pub fn normalize_lexically<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `path` lies under `root`, compared component-wise.
pub fn is_within<P: AsRef<Path>, R: AsRef<Path>>(path: P, root: R) -> bool {
    normalize_lexically(path).starts_with(normalize_lexically(root))
}

/// True if the file name of `path` carries the extension `ext` (without the dot).
pub fn has_extension<P: AsRef<Path>>(path: P, ext: &str) -> bool {
    path.as_ref()
        .extension()
        .map(|e| e.to_string_lossy() == ext)
        .unwrap_or(false)
}

/// The directory a note's relative references resolve against.
pub fn note_dir(note_path: &Path) -> &Path {
    note_path.parent().unwrap_or_else(|| Path::new(""))
}
