use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_URL: &str = "VAANI_API_URL";
pub const ENV_MODEL: &str = "VAANI_MODEL";
pub const ENV_DELAY_MS: &str = "VAANI_DELAY_MS";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extraction endpoint receiving `POST` requests
    pub api_url: String,

    /// Model used by `run` when none is given on the command line
    pub default_model: String,

    /// Pause between two cases of a batch (ms)
    pub inter_case_delay_ms: u64,

    /// Per-request timeout (ms)
    pub request_timeout_ms: u64,

    /// Models compared by `playground` when none are given
    pub playground_models: Vec<String>,

    /// Suite file and reports live here
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/extract".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            inter_case_delay_ms: 200,
            request_timeout_ms: 30_000,
            playground_models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "claude-3-haiku".to_string(),
            ],
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl Config {
    /// Defaults, then the YAML file, then `VAANI_*` environment variables.
    ///
    /// An explicit `path` must exist. Without one, the per-user config file is
    /// read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overlay values found by `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.default_model = model;
        }
        if let Some(delay) = get(ENV_DELAY_MS) {
            self.inter_case_delay_ms = delay
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds", ENV_DELAY_MS))?;
        }
        Ok(())
    }

    pub fn suite_path(&self) -> PathBuf {
        self.output_dir.join("suite.json")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn inter_case_delay(&self) -> Duration {
        Duration::from_millis(self.inter_case_delay_ms)
    }
}

/// `<config_dir>/vaani-tester/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vaani-tester").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let yaml = "api_url: http://api.test/extract\ninter_case_delay_ms: 50\n";
        std::fs::write(&path, yaml).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api_url, "http://api.test/extract");
        assert_eq!(config.inter_case_delay(), Duration::from_millis(50));
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "api_uri: http://typo\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.yaml"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://env.test/extract"),
            (ENV_MODEL, "  "),
            (ENV_DELAY_MS, "0"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url, "http://env.test/extract");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.inter_case_delay_ms, 0);

        let mut config = Config::default();
        let bad = config.apply_env(|key| (key == ENV_DELAY_MS).then(|| "soon".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_suite_path() {
        let config = Config {
            output_dir: PathBuf::from("/tmp/vaani"),
            ..Config::default()
        };
        assert_eq!(config.suite_path(), PathBuf::from("/tmp/vaani/suite.json"));
    }
}
