//! Config store for loading rollout.toml.

use std::path::{Path, PathBuf};

use super::{parser, schema::RolloutConfig};

pub const CONFIG_FILE_NAME: &str = "rollout.toml";

/// Read-only access to the deployment configuration file.
///
/// A missing file yields the built-in defaults; deployments are expected to
/// ship a config next to the package payload, but the engine runs without
/// one.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Store over `rollout.toml` in the current working directory.
    pub fn from_current_dir() -> anyhow::Result<Self> {
        Ok(Self::new(std::env::current_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<RolloutConfig> {
        if !self.config_path.exists() {
            return Ok(RolloutConfig::default());
        }
        parser::parse_rollout_toml(&self.config_path)
    }
}
