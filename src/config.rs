use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::logging::{parse_log_level, LogConfig, LogDestination, LogFormat};
use crate::notifications::ids::DEFAULT_MAX_OBSERVER_ID;
use crate::notifications::center::{default_worker_threads, CenterConfig};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "NOTIFLY_CONFIG";

/// Default `post_and_wait` timeout used by the command line tool
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 500;

/// `[engine]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineSection {
    pub worker_threads: usize,
    pub max_observer_id: u32,
    pub request_timeout_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            max_observer_id: DEFAULT_MAX_OBSERVER_ID,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub file_level: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
            file_level: None,
        }
    }
}

/// Complete configuration as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotiflyConfig {
    pub engine: EngineSection,
    pub logging: LoggingSection,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl NotiflyConfig {
    /// Load configuration using the discovery hierarchy; defaults when no file exists
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML content")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.worker_threads == 0 {
            anyhow::bail!("engine.worker-threads must be at least 1");
        }
        if self.engine.max_observer_id == 0 {
            anyhow::bail!("engine.max-observer-id must be at least 1");
        }
        if self.engine.max_observer_id > DEFAULT_MAX_OBSERVER_ID {
            anyhow::bail!(
                "engine.max-observer-id must not exceed {}",
                DEFAULT_MAX_OBSERVER_ID
            );
        }
        parse_log_level(&self.logging.level).context("Invalid logging.level")?;
        if let Some(level) = &self.logging.file_level {
            parse_log_level(level).context("Invalid logging.file-level")?;
        }
        Ok(())
    }

    /// Engine settings for a notification center
    pub fn center_config(&self) -> CenterConfig {
        CenterConfig {
            worker_threads: self.engine.worker_threads,
            max_observer_id: self.engine.max_observer_id,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.request_timeout_ms)
    }

    /// Logger settings; a configured file logs at `file-level`, or `level` if unset
    pub fn log_config(&self) -> Result<LogConfig> {
        let console_level = parse_log_level(&self.logging.level)?;
        let file_level = match &self.logging.file_level {
            Some(level) => Some(parse_log_level(level)?),
            None => self.logging.file.as_ref().map(|_| console_level),
        };

        let destination = match &self.logging.file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Console,
        };

        Ok(LogConfig {
            console_level,
            file_level: file_level.filter(|level| *level != LevelFilter::Off),
            format: self.logging.format,
            destination,
        })
    }
}

/// Configuration file candidates in order of precedence
pub fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        paths.push(PathBuf::from(env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("notifly").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".notifly.toml"));
    }

    paths.push(PathBuf::from("./.notifly.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = NotiflyConfig::from_toml_str("").unwrap();
        assert_eq!(config, NotiflyConfig::default());
        assert!(config.engine.worker_threads >= 1);
        assert_eq!(config.engine.max_observer_id, DEFAULT_MAX_OBSERVER_ID);
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_sections() {
        let config = NotiflyConfig::from_toml_str(
            r#"
[engine]
worker-threads = 3

[logging]
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.engine.worker_threads, 3);
        assert_eq!(config.engine.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation() {
        assert!(NotiflyConfig::from_toml_str("[engine]\nworker-threads = 0").is_err());
        assert!(NotiflyConfig::from_toml_str("[engine]\nmax-observer-id = 0").is_err());
        assert!(NotiflyConfig::from_toml_str("[engine]\nmax-observer-id = 2147483648").is_err());
        assert!(NotiflyConfig::from_toml_str("[engine]\nmax-observer-id = 2147483647").is_ok());
        assert!(NotiflyConfig::from_toml_str("[logging]\nlevel = \"loud\"").is_err());
        assert!(NotiflyConfig::from_toml_str("[logging]\nformat = \"xml\"").is_err());
        assert!(NotiflyConfig::from_toml_str("[engine\n").is_err());
    }

    #[test]
    fn test_center_config() {
        let config = NotiflyConfig::from_toml_str("[engine]\nworker-threads = 2\nmax-observer-id = 10").unwrap();
        assert_eq!(
            config.center_config(),
            CenterConfig {
                worker_threads: 2,
                max_observer_id: 10
            }
        );
    }

    #[test]
    fn test_log_config() {
        let config = NotiflyConfig::from_toml_str(
            r#"
[logging]
level = "warn"
file = "/tmp/notifly-test.log"
file-level = "trace"
"#,
        )
        .unwrap();

        let log = config.log_config().unwrap();
        assert_eq!(log.console_level, LevelFilter::Warn);
        assert_eq!(log.file_level, Some(LevelFilter::Trace));
        assert_eq!(log.destination, LogDestination::Both(PathBuf::from("/tmp/notifly-test.log")));

        let console = NotiflyConfig::default().log_config().unwrap();
        assert_eq!(console.destination, LogDestination::Console);
        assert_eq!(console.file_level, None);
    }

    #[test]
    fn test_load_from_file() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, "[engine]\nrequest-timeout-ms = 50\n").unwrap();

        let config = NotiflyConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.engine.request_timeout_ms, 50);
        assert_eq!(config.source.as_deref(), Some(temp_file.path()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(NotiflyConfig::load_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_discovery_order() {
        let paths = discover_config_files();
        assert_eq!(paths.last(), Some(&PathBuf::from("./.notifly.toml")));
    }
}
