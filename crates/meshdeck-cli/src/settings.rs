use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::logging::LogFormat;

/// Settings file looked up inside the meshdeck home directory.
pub const SETTINGS_FILE: &str = "meshdeck.toml";

/// Process settings loaded from `meshdeck.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Where the network list and app config are stored. Defaults to the
    /// meshdeck home directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Telemetry poll interval (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Snapshots kept per instance.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_poll_interval() -> u64 {
    1
}
fn default_history_capacity() -> usize {
    meshdeck_core::history::HISTORY_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            poll_interval_secs: default_poll_interval(),
            history_capacity: default_history_capacity(),
            log_format: LogFormat::default(),
        }
    }
}

/// `$MESHDECK_HOME`, else `$HOME/.meshdeck`.
pub fn home_dir() -> Result<PathBuf> {
    resolve_home(
        std::env::var_os("MESHDECK_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn resolve_home(meshdeck_home: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    match (meshdeck_home, home) {
        (Some(dir), _) if !dir.as_os_str().is_empty() => Ok(dir),
        (_, Some(home)) if !home.as_os_str().is_empty() => Ok(home.join(".meshdeck")),
        _ => anyhow::bail!("Cannot locate a data directory: set MESHDECK_HOME or HOME"),
    }
}

impl Settings {
    /// Load from an explicit file, or from `<home>/meshdeck.toml` when it
    /// exists, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = home_dir()?.join(SETTINGS_FILE);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse settings from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s).with_context(|| "Failed to parse settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be at least 1");
        }
        if self.history_capacity == 0 {
            anyhow::bail!("history_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => home_dir(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.history_capacity, 120);
        assert_eq!(settings.log_format, LogFormat::Human);
    }

    #[test]
    fn test_parse_full() {
        let toml = r#"
data_dir = "/var/lib/meshdeck"
poll_interval_secs = 5
history_capacity = 30
log_format = "json"
"#;
        let settings = Settings::parse(toml).unwrap();
        assert_eq!(settings.data_dir().unwrap(), PathBuf::from("/var/lib/meshdeck"));
        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
        assert_eq!(settings.history_capacity, 30);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let err = Settings::parse("poll_interval_secs = 0").unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        assert!(Settings::parse("history_capacity = 0").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_log_format() {
        let err = Settings::parse("log_format = \"yaml\"").unwrap_err();
        assert!(format!("{:#}", err).contains("yaml"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "history_capacity = 10\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.history_capacity, 10);

        assert!(Settings::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_resolve_home() {
        assert_eq!(
            resolve_home(Some("/opt/md".into()), Some("/home/u".into())).unwrap(),
            PathBuf::from("/opt/md")
        );
        assert_eq!(
            resolve_home(Some("".into()), Some("/home/u".into())).unwrap(),
            PathBuf::from("/home/u/.meshdeck")
        );
        assert!(resolve_home(None, None).is_err());
    }
}
