//! Run configuration: environment snapshot and the persisted user config file.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variables consulted for a GitHub token, in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// Snapshot of the process environment taken once at startup
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    /// Capture the current process environment
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Non-empty value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// First GitHub token found in the environment
    pub fn github_token(&self) -> Option<&str> {
        TOKEN_ENV_VARS.iter().find_map(|key| self.get(key))
    }
}

/// Persisted per-user settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// GitHub token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Fields written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Load and save [`UserConfig`]
pub trait UserConfigStore: Send + Sync {
    /// Read the config; a missing file is an empty config
    fn load(&self) -> Result<UserConfig>;

    /// Overwrite the config
    fn save(&self, config: &UserConfig) -> Result<()>;
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `{config_dir}/kodegen/release.json`
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(dir.join("kodegen").join("release.json")))
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserConfigStore for JsonConfigStore {
    fn load(&self) -> Result<UserConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(UserConfig::default()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(UserConfig::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            ConfigError::Corrupted {
                path: self.path.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn save(&self, config: &UserConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = serde_json::to_string_pretty(config)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;
        log::debug!("Saved user config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_token_precedence() {
        let env = EnvConfig::from_pairs([("GITHUB_TOKEN", "second"), ("GH_TOKEN", "first")]);
        assert_eq!(env.github_token(), Some("first"));

        let env = EnvConfig::from_pairs([("GH_TOKEN", "  "), ("GITHUB_TOKEN", "second")]);
        assert_eq!(env.github_token(), Some("second"));

        assert_eq!(EnvConfig::default().github_token(), None);
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::new(tmp.path().join("nope.json"));
        assert_eq!(store.load().unwrap(), UserConfig::default());
    }

    #[test]
    fn test_save_keeps_extra_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kodegen").join("release.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"editor":"vim","token":"old"}"#).unwrap();

        let store = JsonConfigStore::new(&path);
        let mut config = store.load().unwrap();
        assert_eq!(config.token.as_deref(), Some("old"));
        config.token = Some("new".to_string());
        store.save(&config).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "new");
        assert_eq!(raw["editor"], "vim");
    }

    #[test]
    fn test_corrupted_file_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("release.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonConfigStore::new(&path).load().unwrap_err();
        assert!(matches!(err, crate::ReleaseError::Config(ConfigError::Corrupted { .. })));
    }
}
