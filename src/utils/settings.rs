//! Settings lookup.
//!
//! Configuration comes from environment variables, falling back to the `env`
//! table of `$HOME/.commit-scrub/settings.json`:
//!
//! ```json
//! { "env": { "GITHUB_TOKEN": "ghp_..." } }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Directory under `$HOME` holding settings and the repository store.
pub const SETTINGS_DIR: &str = ".commit-scrub";

/// Contents of the settings file.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Fallback values for environment variables.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads the settings file from its default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::get_settings_path()?)
    }

    /// Loads a settings file; a missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns `$HOME/.commit-scrub/settings.json`.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(SETTINGS_DIR).join("settings.json"))
    }

    /// Returns `key` from the environment, else from these settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| self.env.get(key).cloned())
    }
}

/// Returns `key` from the environment, else from the settings file.
pub fn get_env_var(key: &str) -> Result<String> {
    if let Ok(value) = env::var(key) {
        return Ok(value);
    }

    let settings = Settings::load()
        .map_err(|err| anyhow!("Environment variable not found: {key}").context(err))?;
    settings
        .get_env_var(key)
        .ok_or_else(|| anyhow!("Environment variable not found: {key}"))
}

/// Returns the first of `keys` that is set, checking each with [`get_env_var`].
pub fn get_env_vars(keys: &[&str]) -> Result<String> {
    keys.iter()
        .find_map(|key| get_env_var(key).ok())
        .ok_or_else(|| anyhow!("None of the environment variables found: {keys:?}"))
}
