//! Configuration for posture-link.

use crate::core::{ClassifierConfig, DEFAULT_MAX_FRAME_LEN};
use crate::link::ReplayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Posture classifier thresholds
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Frame reassembly limits
    #[serde(default)]
    pub framing: FramingConfig,

    /// Capture replay pacing
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("posture-link")
            .join("config.json")
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.trigger_count == 0 {
            return Err(ConfigError::InvalidValue(
                "classifier.trigger_count must be at least 1".to_string(),
            ));
        }
        if self.classifier.gyro_trigger < 0 {
            return Err(ConfigError::InvalidValue(
                "classifier.gyro_trigger must not be negative".to_string(),
            ));
        }
        if self.framing.max_frame_len == 0 {
            return Err(ConfigError::InvalidValue(
                "framing.max_frame_len must be at least 1".to_string(),
            ));
        }
        if self.replay.chunk_size == 0 {
            return Err(ConfigError::InvalidValue(
                "replay.chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Frame reassembly limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Characters buffered before an incomplete frame is abandoned
    pub max_frame_len: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::posture::DEFAULT_TRIGGER_COUNT;
    use crate::link::replay::DEFAULT_CHUNK_SIZE;
    use std::time::Duration;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("posture-link-test-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.classifier.gyro_trigger, 400);
        assert_eq!(config.classifier.trigger_count, 3);
        assert_eq!(config.framing.max_frame_len, 100);
        assert_eq!(config.replay.chunk_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_config_path();
        let mut config = Config::default();
        config.classifier.gyro_trigger = 250;
        config.replay.chunk_interval = Duration::from_millis(240);
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"chunk_interval\": 240"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let loaded = Config::load_from(&temp_config_path()).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"framing": {"max_frame_len": 64}}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.framing.max_frame_len, 64);
        assert_eq!(loaded.classifier, ClassifierConfig::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let path = temp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"classifier": {"gyro_trigger": 250}, "replay": {"chunk_interval": 15}, "framing": {}}"#,
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.classifier.gyro_trigger, 250);
        assert_eq!(loaded.classifier.trigger_count, DEFAULT_TRIGGER_COUNT);
        assert_eq!(loaded.replay.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(loaded.replay.chunk_interval, Duration::from_millis(15));
        assert_eq!(loaded.framing, FramingConfig::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.classifier.trigger_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        let path = temp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
