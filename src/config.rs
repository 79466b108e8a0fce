use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::history::{DEFAULT_EXPORT_FILE, DEFAULT_HISTORY_FILE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub history_file: PathBuf,
    /// File name used when an export target is a directory or left blank.
    pub export_file_name: String,
    /// Show evaluation steps for every calculation.
    pub details: bool,
    pub persist_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
            details: false,
            persist_history: true,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rpncalc").join("config.toml"))
    }

    /// An explicit path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::scratch_dir;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml("history_file = \"/tmp/calc.txt\"\ndetails = true\n").unwrap();
        assert_eq!(config.history_file, PathBuf::from("/tmp/calc.txt"));
        assert!(config.details);
        assert!(config.persist_history);
        assert_eq!(config.export_file_name, "log.log");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_toml("histroy_file = \"x\"").is_err());
        assert!(Config::from_toml("details = \"yes\"").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = scratch_dir("config");
        let path = dir.join("config.toml");
        fs::write(&path, "persist_history = false\nexport_file_name = \"out.txt\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(!config.persist_history);
        assert_eq!(config.export_file_name, "out.txt");

        assert!(Config::load(Some(dir.join("missing.toml").as_path())).is_err());
    }
}
