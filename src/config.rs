//! Optional YAML configuration.
//!
//! Every field has a default, so an empty file (or no file) is valid.
//! Command-line flags override what is loaded here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::analysis::SmellThresholds;

/// File names looked up in the analyzed root, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["codepulse.yaml", ".codepulse.yaml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Extensions to scan, with or without the leading dot. Empty means
    /// every extension a registered analyzer supports.
    pub extensions: Vec<String>,
    /// Glob patterns matched against root-relative paths (e.g. "**/gen/**").
    pub excluded_paths: Vec<String>,
    pub workers: Option<usize>,
    pub format: Option<String>,
    pub smells: SmellThresholds,
}

impl Config {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse_str(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // serde_yaml rejects an empty document for a struct.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.workers == Some(0) {
            anyhow::bail!("workers must be at least 1");
        }
        Ok(())
    }

    /// Load `explicit` if given, else the first default name found in `root`,
    /// else the defaults.
    pub fn load(explicit: Option<&Path>, root: &Path) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::parse_file(path),
            None => match discover(root) {
                Some(path) => Self::parse_file(path),
                None => Ok(Self::default()),
            },
        }
    }
}

/// Find a config file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
extensions: [go, ".c"]
excluded_paths:
  - "**/gen/**"
workers: 3
format: sarif
smells:
  many_parameters: 7
  deep_nesting: 6
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.extensions, vec!["go", ".c"]);
        assert_eq!(config.excluded_paths, vec!["**/gen/**"]);
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.format.as_deref(), Some("sarif"));
        assert_eq!(config.smells.many_parameters, 7);
        assert_eq!(config.smells.deep_nesting, 6);
        // Unset thresholds keep their defaults.
        assert_eq!(config.smells.many_locals, 15);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse_str("").unwrap(), Config::default());
        assert_eq!(Config::parse_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = Config::parse_str("workers: 0").unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Config::parse_str("extensions: {").is_err());
    }

    #[test]
    fn test_discover_prefers_plain_name() {
        let dir = TempDir::new().unwrap();
        assert!(discover(dir.path()).is_none());

        fs::write(dir.path().join(".codepulse.yaml"), "workers: 2").unwrap();
        assert_eq!(
            discover(dir.path()),
            Some(dir.path().join(".codepulse.yaml"))
        );

        fs::write(dir.path().join("codepulse.yaml"), "workers: 4").unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.workers, Some(4));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = Config::load(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }
}
