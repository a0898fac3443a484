use std::{fmt, io, path::PathBuf, string::FromUtf8Error};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "service")]
use notify::{Error as NotifyError, ErrorKind as NotifyErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum TrackerError {
    #[error("Invalid Command: {0}")]
    Command(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Malformed result row: {0}")]
    MalformedResultRow(String),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl TrackerError {
    /// True for errors raised by the index itself rather than by local input.
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            TrackerError::IndexUnavailable(_) | TrackerError::MalformedResultRow(_)
        )
    }
}

impl From<toml::de::Error> for TrackerError {
    fn from(src: toml::de::Error) -> TrackerError {
        TrackerError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<io::Error> for TrackerError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => TrackerError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => TrackerError::PermissionDenied,
            _ => TrackerError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for TrackerError {
    fn from(x: fmt::Error) -> Self {
        TrackerError::Serialization(format!("{x}"))
    }
}

impl From<RegexError> for TrackerError {
    fn from(x: RegexError) -> Self {
        TrackerError::Serialization(format!("Regex parse failed: {x}"))
    }
}

impl From<FromUtf8Error> for TrackerError {
    fn from(x: FromUtf8Error) -> Self {
        TrackerError::Serialization(format!("Percent-decoded identifier is not UTF-8: {x}"))
    }
}

impl From<walkdir::Error> for TrackerError {
    fn from(x: walkdir::Error) -> Self {
        match x.into_io_error() {
            Some(io_error) => TrackerError::from(io_error),
            None => TrackerError::Io("directory walk hit a filesystem loop".to_string()),
        }
    }
}

#[cfg(feature = "service")]
impl From<NotifyError> for TrackerError {
    fn from(notify_error: NotifyError) -> Self {
        match notify_error.kind {
            NotifyErrorKind::Generic(msg) => TrackerError::Io(format!(
                "notify-debouncer: {}, paths: {:?}",
                msg, notify_error.paths
            )),
            NotifyErrorKind::Io(io_error) => TrackerError::Io(format!(
                "notify-debouncer: io error {}, paths: {:?}",
                io_error.kind(),
                notify_error.paths
            )),
            NotifyErrorKind::PathNotFound => TrackerError::NotFound(format!(
                "notify-debouncer: path(s) not found: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::WatchNotFound => TrackerError::NotFound(format!(
                "notify-debouncer: watch not found, paths: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::InvalidConfig(_) => {
                TrackerError::Config("notify-debouncer invalid config".to_string())
            }
            NotifyErrorKind::MaxFilesWatch => {
                TrackerError::Io("notify-debouncer max file watch limit reached".to_string())
            }
        }
    }
}
