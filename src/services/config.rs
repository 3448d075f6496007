use crate::models::config::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration manager for engine settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for `<config_dir>/rok-ocr/config.json`
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?.join("rok-ocr");
        Ok(Self::in_dir(config_dir))
    }

    /// Manager rooted at an explicit directory
    pub fn in_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let config_path = config_dir.join("config.json");

        Self {
            config_dir,
            config_path,
        }
    }

    /// Save configuration to disk as pretty JSON
    pub fn save(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;

        fs::create_dir_all(&self.config_dir)?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json)?;

        info!(path = %self.config_path.display(), "Configuration saved");
        Ok(())
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> Result<EngineConfig, ConfigError> {
        if !self.config_exists() {
            return Ok(EngineConfig::default());
        }

        load_from(&self.config_path)
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}

/// Read and validate a config file at an arbitrary path
pub fn load_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;

    /// Helper to create a temporary test config manager
    fn create_test_manager() -> ConfigManager {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!("rok-ocr-config-test-{}-{}", std::process::id(), id));
        let _ = fs::remove_dir_all(&temp_dir);

        ConfigManager::in_dir(temp_dir)
    }

    fn cleanup_test_files(manager: &ConfigManager) {
        let _ = fs::remove_dir_all(&manager.config_dir);
    }

    #[test]
    fn test_config_load_default_when_not_exists() {
        let manager = create_test_manager();
        assert!(!manager.config_exists());

        let config = manager.load().expect("load() should return default when file doesn't exist");
        assert_eq!(config, EngineConfig::default());

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_save_and_load() {
        let manager = create_test_manager();

        let mut config = EngineConfig::default();
        config.retry.extractor_attempts = 5;
        config.repair.strategies = vec![Strategy::Sharpen];
        config.recognizer.base_url = "http://ocr.local:9000".to_string();

        manager.save(&config).expect("save should succeed");
        assert!(manager.config_exists(), "Config file should exist after save");

        let loaded = manager.load().expect("load should succeed");
        assert_eq!(loaded, config);

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_partial_file_fills_defaults() {
        let manager = create_test_manager();
        fs::create_dir_all(&manager.config_dir).unwrap();
        fs::write(manager.config_file_path(), r#"{"merge": {"confidence_tie_band": 8.0}}"#).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.merge.confidence_tie_band, 8.0);
        assert_eq!(loaded.retry, EngineConfig::default().retry, "Missing sections use defaults");

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        let manager = create_test_manager();

        let mut config = EngineConfig::default();
        config.thresholds.ui_keyword = 1.5;
        assert!(matches!(manager.save(&config), Err(ConfigError::Invalid(_))));

        fs::create_dir_all(&manager.config_dir).unwrap();
        fs::write(manager.config_file_path(), r#"{"retry": {"extractor_attempts": 0}}"#).unwrap();
        assert!(matches!(manager.load(), Err(ConfigError::Invalid(_))));

        fs::write(manager.config_file_path(), "{ not json").unwrap();
        assert!(matches!(manager.load(), Err(ConfigError::Parse(_))));

        cleanup_test_files(&manager);
    }

    #[test]
    fn test_config_file_path() {
        let manager = create_test_manager();
        assert!(manager.config_file_path().to_str().unwrap().ends_with("config.json"));
    }
}
