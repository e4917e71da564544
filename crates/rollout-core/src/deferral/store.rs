//! Deferral record persistence in the XDG state directory.
//!
//! Records are stored per package in the user's state directory, not next to
//! the deployed software, so reruns of the same deployment attempt find their
//! accounting regardless of working directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::state::DeferralState;

/// Keyed record storage for deferral state.
///
/// Records live in:
/// - Unix: `$XDG_STATE_HOME/rollout/deferrals/` (fallback: `~/.local/state/rollout/deferrals/`)
/// - Windows: `%LOCALAPPDATA%\rollout\deferrals\`
///
/// One file per package: `<package_key>.json`.
pub struct LedgerStore;

impl LedgerStore {
    /// Default state directory for deferral records.
    pub fn default_state_dir() -> anyhow::Result<PathBuf> {
        let base = if cfg!(unix) {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .ok_or_else(|| anyhow::anyhow!("Cannot determine state directory"))?
        } else {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Cannot determine local app data directory"))?
        };
        Ok(base.join("rollout").join("deferrals"))
    }

    /// Stable file key for a package identity.
    pub fn package_key(package: &str) -> String {
        blake3::hash(package.as_bytes()).to_hex().to_string()
    }

    fn record_path(store_dir: &Path, package: &str) -> PathBuf {
        store_dir.join(format!("{}.json", Self::package_key(package)))
    }

    /// Load the persisted state for a package, if any.
    pub fn load(store_dir: &Path, package: &str) -> anyhow::Result<Option<DeferralState>> {
        let path = Self::record_path(store_dir, package);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read deferral record: {}", path.display()))?;
        let state: DeferralState = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse deferral record: {}", path.display()))?;
        Ok(Some(state))
    }

    /// Save a package's state atomically (tmp + rename).
    pub fn save(store_dir: &Path, package: &str, state: &DeferralState) -> anyhow::Result<()> {
        fs::create_dir_all(store_dir).with_context(|| {
            format!("Failed to create deferral store: {}", store_dir.display())
        })?;

        let path = Self::record_path(store_dir, package);
        let tmp_path = store_dir.join(format!(
            "{}.json.tmp.{}",
            Self::package_key(package),
            std::process::id()
        ));

        let bytes =
            serde_json::to_vec_pretty(state).context("Failed to serialize deferral record")?;
        fs::write(&tmp_path, bytes)
            .with_context(|| format!("Failed to write tmp record: {}", tmp_path.display()))?;

        // Rename-over-existing needs the target gone first on Windows.
        if path.exists() {
            fs::remove_file(&path).with_context(|| {
                format!("Failed to remove existing record: {}", path.display())
            })?;
        }
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to rename tmp record: {}", tmp_path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferral::state::DeferralPolicy;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn load_missing_returns_none() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let loaded = LedgerStore::load(tmp.path(), "app").expect("load should succeed");
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let store_dir = tmp.path().join("deferrals");

        let policy = DeferralPolicy {
            allowance: 3,
            deadline: None,
            deadline_days: None,
        };
        let state = DeferralState::init(&policy, Utc::now());

        LedgerStore::save(&store_dir, "contoso-app", &state).expect("save should succeed");
        let loaded = LedgerStore::load(&store_dir, "contoso-app")
            .expect("load should succeed")
            .expect("record should exist");

        assert_eq!(loaded, state);
    }

    #[test]
    fn package_keys_are_stable_and_distinct() {
        let key1 = LedgerStore::package_key("app-a");
        let key2 = LedgerStore::package_key("app-a");
        let key3 = LedgerStore::package_key("app-b");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.len(), 64); // blake3 hex output
    }

    #[test]
    fn save_leaves_no_tmp_files() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let store_dir = tmp.path().join("deferrals");
        let state = DeferralState::init(&DeferralPolicy::default(), Utc::now());

        for _ in 0..3 {
            LedgerStore::save(&store_dir, "app", &state).expect("save should succeed");
        }

        let leftovers: Vec<_> = fs::read_dir(&store_dir)
            .expect("read_dir should succeed")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "tmp files should be cleaned up");
    }
}
