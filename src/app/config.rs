//! Configuration Management

use crate::analysis::quality::QualityConfig;
use crate::capture::monitor::MonitorConfig;
use crate::capture::recorder::RecorderConfig;
use crate::submit::client::SubmitConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attempt recorder settings
    pub recorder: RecorderConfig,
    /// Environment monitor settings
    pub monitor: MonitorConfig,
    /// Quality scoring settings
    pub quality: QualityConfig,
    /// Submission transport settings
    pub submit: SubmitConfig,
    /// Session settings
    pub session: SessionConfig,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Attempts to capture per word
    pub target_attempts: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { target_attempts: 3 }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !(1..=10).contains(&self.target_attempts) {
            return Err(crate::Error::Config(format!(
                "target_attempts must be in [1, 10], got {}",
                self.target_attempts
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Validate every section. Returns the first invalid field.
    pub fn validate(&self) -> crate::Result<()> {
        self.recorder.validate()?;
        self.monitor.validate()?;
        self.quality.validate()?;
        self.submit.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location, falling back to defaults when
    /// no file exists.
    pub fn load_default() -> crate::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> crate::Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to the default location
    pub fn save_default(&self) -> crate::Result<()> {
        self.save(&Self::default_path())
    }

    /// Default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".signcap").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate the TOML representation
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.recorder.countdown_secs = 3;
        config.session.target_attempts = 5;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.recorder.countdown_secs, 3);
        assert_eq!(loaded.session.target_attempts, 5);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.recorder.hard_stop_secs = 1.0; // below the soft target
        let toml = toml::to_string_pretty(&config).unwrap();
        std::fs::write(&path, toml).unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ntarget_attempts = 4\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.session.target_attempts, 4);
        assert_eq!(config.recorder.min_frames, RecorderConfig::default().min_frames);
    }

    #[test]
    fn test_invalid_session_bounds() {
        let config = SessionConfig { target_attempts: 0 };
        assert!(config.validate().is_err());
        let config = SessionConfig {
            target_attempts: 11,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_toml_contains_sections() {
        let toml = Config::default().to_toml().unwrap();
        for section in ["[recorder]", "[monitor]", "[quality]", "[submit]", "[session]"] {
            assert!(toml.contains(section), "missing {section}");
        }
    }
}
