use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::TrackerError;

/// Lifecycle event reported for a note file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileEvent {
    Create,
    Modify,
    /// The note is gone; every relation it takes part in is dropped.
    Delete,
}

impl FileEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileEvent::Create => "CREATE",
            FileEvent::Modify => "MODIFY",
            FileEvent::Delete => "DELETE",
        }
    }
}

impl Display for FileEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileEvent {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(FileEvent::Create),
            "MODIFY" => Ok(FileEvent::Modify),
            "DELETE" => Ok(FileEvent::Delete),
            other => Err(TrackerError::Command(format!(
                "unknown event '{other}', expected one of CREATE, MODIFY, DELETE"
            ))),
        }
    }
}

/// One outcome of reconciling a note against the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationEvent {
    /// Note, other endpoint: both directions inserted.
    Linked(PathBuf, PathBuf),
    /// Note, other endpoint: both directions deleted.
    Unlinked(PathBuf, PathBuf),
    /// Note, other endpoint: no longer referenced by the note but still claimed by the other side.
    Preserved(PathBuf, PathBuf),
    /// Note, other endpoint, error from the index. The pass moved on to the next candidate.
    Failed(PathBuf, PathBuf, TrackerError),
}

impl Display for RelationEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            RelationEvent::Linked(a, b) => write!(f, "linked {} <-> {}", a.display(), b.display()),
            RelationEvent::Unlinked(a, b) => {
                write!(f, "unlinked {} <-> {}", a.display(), b.display())
            }
            RelationEvent::Preserved(a, b) => write!(
                f,
                "kept {} <-> {}: {} still relates back",
                a.display(),
                b.display(),
                b.display()
            ),
            RelationEvent::Failed(a, b, e) => {
                write!(f, "failed {} <-> {}: {}", a.display(), b.display(), e)
            }
        }
    }
}
