//! Multi-provider credential storage
//!
//! Stores API keys for each provider in a JSON file under the config
//! directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::providers::ProviderId;
use crate::paths;

/// Storage for API keys indexed by provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialStore {
    /// API keys by provider storage key
    #[serde(flatten)]
    keys: HashMap<String, String>,
}

impl CredentialStore {
    /// Get the credentials file path
    fn path() -> PathBuf {
        paths::config_dir().join("tokens").join("credentials.json")
    }

    /// Load credentials from disk
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load credentials from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let store: CredentialStore = serde_json::from_str(&contents)?;
        Ok(store)
    }

    /// Save credentials to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Save credentials to a specific path
    ///
    /// Uses atomic write-to-temp-file-then-rename to prevent corruption.
    /// On Unix, sets 0600 (user read/write only) before the rename.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = fs::metadata(&temp_path) {
                let mut permissions = metadata.permissions();
                permissions.set_mode(0o600);
                fs::set_permissions(&temp_path, permissions)
                    .map_err(|e| anyhow::anyhow!("Failed to set secure file permissions: {}", e))?;
            } else {
                tracing::warn!("Could not get metadata for credentials temp file, permissions not set");
            }
        }

        fs::rename(&temp_path, path)?;

        #[cfg(windows)]
        {
            tracing::warn!(
                "Windows: File permissions not set - credentials may be accessible to other users"
            );
        }

        tracing::debug!("Credentials saved atomically to {:?}", path);
        Ok(())
    }

    /// Get API key for a provider
    pub fn get(&self, provider: &ProviderId) -> Option<&String> {
        self.keys.get(provider.storage_key())
    }

    /// Set API key for a provider
    pub fn set(&mut self, provider: ProviderId, key: String) {
        self.keys.insert(provider.storage_key().to_string(), key);
    }

    /// Check if a provider has a stored API key
    pub fn has_key(&self, provider: &ProviderId) -> bool {
        self.keys.contains_key(provider.storage_key())
    }

    /// Remove API key for a provider
    pub fn remove(&mut self, provider: &ProviderId) {
        self.keys.remove(provider.storage_key());
    }

    /// Get all providers with stored API keys
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::all()
            .iter()
            .filter(|p| self.has_key(p))
            .copied()
            .collect()
    }
}
