// Logging for notifly
// Structured log output for the engine, the bridge and the command line tool
//
// - Text or JSON lines
// - Console (stderr), a file, or both, each with its own level
// - Timestamps as YYYY-MM-DD HH:MM:SS in local time
// - Records carry their target module and the emitting thread, so async
//   dispatch on the worker pool (threads named notifly-worker-N) is traceable
//
// Example usage:
// ```
// let config = LogConfig {
//     console_level: LevelFilter::Warn,
//     file_level: Some(LevelFilter::Trace),
//     format: LogFormat::Json,
//     destination: LogDestination::Both(PathBuf::from("notifly.log")),
// };
// init_logger(config)?;
// log::info!("Notification center started");
// ```

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

impl LogDestination {
    fn file_path(&self) -> Option<&Path> {
        match self {
            LogDestination::Console => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }
}

/// One JSON log line
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

impl LogConfig {
    /// Most verbose level any destination wants
    pub fn max_level(&self) -> LevelFilter {
        match self.file_level {
            Some(file_level) if self.destination.file_path().is_some() => file_level.max(self.console_level),
            _ => self.console_level,
        }
    }
}

pub struct NotiflyLogger {
    config: LogConfig,
    file: Mutex<Option<File>>,
}

impl NotiflyLogger {
    /// Create a logger, opening the log file up front if there is one
    pub fn new(config: LogConfig) -> Result<Self> {
        let file = match config.destination.file_path() {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            file: Mutex::new(file),
        })
    }

    fn format_timestamp() -> String {
        let now: DateTime<Local> = Local::now();
        now.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn format_text_message(&self, level: Level, target: &str, message: &str) -> String {
        format!(
            "{} [{}] {}: {}",
            Self::format_timestamp(),
            level.to_string().to_uppercase(),
            target,
            message
        )
    }

    fn format_json_message(&self, level: Level, target: &str, message: &str) -> Result<String> {
        let entry = JsonLogEntry {
            timestamp: Self::format_timestamp(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            thread: thread::current().name().map(str::to_string),
            message: message.to_string(),
        };

        serde_json::to_string(&entry).context("Failed to serialize log entry to JSON")
    }

    fn should_log_to_console(&self, level: Level) -> bool {
        match self.config.destination {
            LogDestination::File(_) => false,
            _ => level <= self.config.console_level,
        }
    }

    fn should_log_to_file(&self, level: Level) -> bool {
        self.config.destination.file_path().is_some() && self.config.file_level.map_or(false, |file_level| level <= file_level)
    }

    fn write_to_console(&self, line: &str) -> Result<()> {
        writeln!(io::stderr(), "{}", line).context("Failed to write to console")
    }

    fn write_to_file(&self, line: &str) -> Result<()> {
        let mut file = self.file.lock();
        match file.as_mut() {
            Some(file) => writeln!(file, "{}", line).context("Failed to write to log file"),
            None => Ok(()),
        }
    }
}

impl log::Log for NotiflyLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.should_log_to_console(metadata.level()) || self.should_log_to_file(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        let level = record.level();
        let to_console = self.should_log_to_console(level);
        let to_file = self.should_log_to_file(level);
        if !to_console && !to_file {
            return;
        }

        let message = record.args().to_string();
        let target = record.target();

        let line = match self.config.format {
            LogFormat::Text => self.format_text_message(level, target, &message),
            LogFormat::Json => match self.format_json_message(level, target, &message) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("JSON formatting error: {}. Falling back to text format.", e);
                    self.format_text_message(level, target, &message)
                }
            },
        };

        if to_console {
            if let Err(e) = self.write_to_console(&line) {
                eprintln!("Console logging error: {}", e);
            }
        }
        if to_file {
            if let Err(e) = self.write_to_file(&line) {
                eprintln!("File logging error: {}", e);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

/// Install the global logger. Fails if one is already installed.
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config.max_level();
    let logger = NotiflyLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("warn").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_log_level("TRACE").unwrap(), LevelFilter::Trace);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_timestamp_format() {
        let timestamp = NotiflyLogger::format_timestamp();
        assert_eq!(timestamp.len(), 19);
        assert_eq!(timestamp.chars().nth(4), Some('-'));
        assert_eq!(timestamp.chars().nth(10), Some(' '));
        assert_eq!(timestamp.chars().nth(13), Some(':'));
    }

    #[test]
    fn test_text_message_carries_target() {
        let logger = NotiflyLogger::new(LogConfig::default()).unwrap();
        let line = logger.format_text_message(Level::Warn, "notifly::notifications::dispatch", "rejected");
        assert!(line.contains("[WARN] notifly::notifications::dispatch: rejected"));
    }

    #[test]
    fn test_json_message_formatting() {
        let logger = NotiflyLogger::new(LogConfig::default()).unwrap();
        let line = logger.format_json_message(Level::Info, "notifly", "started").unwrap();

        let entry: JsonLogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(entry.level, "INFO");
        assert_eq!(entry.target, "notifly");
        assert_eq!(entry.message, "started");
    }

    #[test]
    fn test_max_level() {
        let console_only = LogConfig {
            file_level: Some(LevelFilter::Trace),
            ..LogConfig::default()
        };
        // no file destination, so the file level is irrelevant
        assert_eq!(console_only.max_level(), LevelFilter::Info);

        let both = LogConfig {
            file_level: Some(LevelFilter::Trace),
            destination: LogDestination::Both(PathBuf::from("unused.log")),
            ..LogConfig::default()
        };
        assert_eq!(both.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_file_destination_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifly.log");
        let logger = NotiflyLogger::new(LogConfig {
            console_level: LevelFilter::Off,
            file_level: Some(LevelFilter::Debug),
            format: LogFormat::Text,
            destination: LogDestination::File(path.clone()),
        })
        .unwrap();

        logger.log(
            &log::Record::builder()
                .level(Level::Debug)
                .target("notifly::test")
                .args(format_args!("observer added"))
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .level(Level::Trace)
                .target("notifly::test")
                .args(format_args!("too verbose"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("observer added"));
        assert!(!contents.contains("too verbose"));
    }

    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            destination: LogDestination::File(dir.path().join("missing").join("notifly.log")),
            ..LogConfig::default()
        };
        assert!(NotiflyLogger::new(config).is_err());
    }
}
