//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use crate::config::{CONFIG_FILE_NAME, ConfigStore};
use crate::deferral::{DeferralLedger, LedgerStore};

/// Paths and service accessors shared by frontends.
///
/// Frontends create this once and pass it to commands.
#[derive(Debug, Clone)]
pub struct AppContext {
    config_path: PathBuf,
    state_dir: PathBuf,
}

impl AppContext {
    /// Context over the default locations: `rollout.toml` in the working
    /// directory (or an explicit path) and the user's state directory.
    pub fn new(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => std::env::current_dir()?.join(CONFIG_FILE_NAME),
        };
        Ok(Self {
            config_path,
            state_dir: LedgerStore::default_state_dir()?,
        })
    }

    /// Create a context with explicit paths (for testing).
    pub fn with_paths(config_path: PathBuf, state_dir: PathBuf) -> Self {
        Self {
            config_path,
            state_dir,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Get a ConfigStore over the context's config file.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.config_path.clone())
    }

    /// Get a DeferralLedger keyed by package identity.
    pub fn deferral_ledger(&self, package: &str) -> DeferralLedger {
        DeferralLedger::new(self.state_dir.clone(), package)
    }
}
