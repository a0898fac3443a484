//! Subprocess transport to the desktop indexer's `sparql` frontend.
//!
//! Each query spawns `<bin> sparql --dbus-service=<service> [--update] --query <text>` and
//! blocks until it exits. No timeout is applied here; whatever the frontend does applies.

use std::process::{Command, Output};

use crate::{config::TrackerCliConfig, error::TrackerError, query::QueryEngine};

#[derive(Debug, Clone)]
pub struct TrackerCli {
    config: TrackerCliConfig,
}

impl TrackerCli {
    pub fn new(config: TrackerCliConfig) -> Self {
        TrackerCli { config }
    }

    pub fn config(&self) -> &TrackerCliConfig {
        &self.config
    }

    fn command(&self, update: bool, text: &str) -> Command {
        let mut cmd = Command::new(&self.config.bin);
        cmd.arg("sparql")
            .arg(format!("--dbus-service={}", self.config.dbus_service));
        if update {
            cmd.arg("--update");
        }
        cmd.arg("--query").arg(text);
        cmd
    }

    fn run(&self, update: bool, text: &str) -> Result<Output, TrackerError> {
        let output = self.command(update, text).output().map_err(|err| {
            TrackerError::IndexUnavailable(format!("spawn {} sparql: {}", self.config.bin, err))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackerError::IndexUnavailable(format!(
                "{} sparql failed ({}): {}",
                self.config.bin,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

impl QueryEngine for TrackerCli {
    fn submit_query(&self, query: &str) -> Result<String, TrackerError> {
        let output = self.run(false, query)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn submit_update(&self, update: &str) -> Result<(), TrackerError> {
        self.run(true, update).map(|_| ())
    }
}
