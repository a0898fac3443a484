use crate::{codec::md::ReferenceExtractor, error::TrackerError};
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::read_to_string,
    path::{Path, PathBuf},
};

/// Directory name under `$XDG_CONFIG_HOME` (or `~/.config`) holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "md-tracker";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_TRACKER_BIN: &str = "tracker3";
pub const DEFAULT_DBUS_SERVICE: &str = "org.freedesktop.Tracker3.Miner.Files";
pub const DEFAULT_NOTE_EXTENSION: &str = "md";
pub const DEFAULT_ASSET_PREFIX: &str = "../assets/";

/// How to reach the indexer's query frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerCliConfig {
    pub bin: String,
    pub dbus_service: String,
}

impl Default for TrackerCliConfig {
    fn default() -> Self {
        Self {
            bin: DEFAULT_TRACKER_BIN.to_string(),
            dbus_service: DEFAULT_DBUS_SERVICE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Where `../assets/<name>` references point. When unset, the prefix is resolved against
    /// the referencing note's own directory.
    pub assets_root: Option<PathBuf>,
    /// Extension (without the dot) identifying note files.
    pub note_extension: String,
    /// Relative prefix that marks an asset reference inside a note.
    pub asset_prefix: String,
    pub tracker: TrackerCliConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            assets_root: None,
            note_extension: DEFAULT_NOTE_EXTENSION.to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            tracker: TrackerCliConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, TrackerError> {
        let config: TrackerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the default location is tried and a missing
    /// file yields the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, TrackerError> {
        match explicit {
            Some(path) => {
                tracing::debug!("Reading config from: {:?}", path);
                Self::from_toml_str(&get_content(path)?)
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => {
                    tracing::debug!("Reading config from: {:?}", path);
                    Self::from_toml_str(&get_content(&path)?)
                }
                _ => {
                    tracing::debug!("Config file not found, using defaults.");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        let base = env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn with_assets_root(mut self, assets_root: PathBuf) -> Self {
        self.assets_root = Some(assets_root);
        self
    }

    /// The assets root with a leading `~/` expanded.
    pub fn assets_root(&self) -> Option<PathBuf> {
        self.assets_root.as_deref().map(expand_home)
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.note_extension.is_empty() || self.note_extension.starts_with('.') {
            return Err(TrackerError::Config(format!(
                "note_extension must be a bare extension such as \"md\", got {:?}",
                self.note_extension
            )));
        }
        if self.asset_prefix.is_empty() {
            return Err(TrackerError::Config(
                "asset_prefix must not be empty".to_string(),
            ));
        }
        if self.tracker.bin.is_empty() {
            return Err(TrackerError::Config(
                "tracker.bin must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn extractor(&self) -> Result<ReferenceExtractor, TrackerError> {
        ReferenceExtractor::new(
            self.assets_root(),
            &self.asset_prefix,
            &self.note_extension,
        )
    }
}

pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, TrackerError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}
