//! Configuration system
//!
//! Configuration structs derive serde and carry their compiled-in defaults.
//! Any of them can be overridden from a TOML or RON file; the format is chosen
//! by file extension.

use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        match extension_of(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Load the first existing file among `candidates`, or fall back to defaults
    fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, ConfigError> {
        for candidate in candidates {
            let path = candidate.as_ref();
            if path.is_file() {
                log::info!("Loading configuration from {}", path.display());
                return Self::load_from_file(path);
            }
        }
        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension_of(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct SampleConfig {
        name: String,
        count: u32,
    }

    impl Default for SampleConfig {
        fn default() -> Self {
            Self { name: "sample".to_string(), count: 3 }
        }
    }

    impl Config for SampleConfig {}

    fn temp_path(file_name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("text_engine_config_{}_{}", std::process::id(), file_name))
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = temp_path("sample.toml");
        let config = SampleConfig { name: "atlas".to_string(), count: 128 };

        config.save_to_file(&path).unwrap();
        let loaded = SampleConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_file_keeps_defaults() {
        let path = temp_path("partial.ron");
        std::fs::write(&path, "(count: 7)").unwrap();

        let loaded = SampleConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.count, 7);
        assert_eq!(loaded.name, "sample");
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_path("sample.json");
        std::fs::write(&path, "{}").unwrap();

        let result = SampleConfig::load_from_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_or_default_without_files() {
        let missing = [temp_path("missing.toml")];
        let loaded = SampleConfig::load_or_default(&missing).unwrap();
        assert_eq!(loaded, SampleConfig::default());
    }
}
