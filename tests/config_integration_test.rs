// Integration tests for configuration loading
use std::fs;
use std::time::Duration;

use notifly::config::NotiflyConfig;
use notifly::logging::{LogDestination, LogFormat};
use notifly::NotificationCenter;
use tempfile::TempDir;

#[test]
fn test_full_configuration_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let log_path = dir.path().join("notifly.log");
    fs::write(
        &path,
        format!(
            r#"
[engine]
worker-threads = 3
max-observer-id = 1000
request-timeout-ms = 250

[logging]
level = "debug"
format = "json"
file = "{}"
file-level = "trace"
"#,
            log_path.display()
        ),
    )
    .unwrap();

    let config = NotiflyConfig::load_from_file(&path).unwrap();
    assert_eq!(config.engine.worker_threads, 3);
    assert_eq!(config.request_timeout(), Duration::from_millis(250));

    let log = config.log_config().unwrap();
    assert_eq!(log.format, LogFormat::Json);
    assert_eq!(log.destination, LogDestination::Both(log_path));

    let center = NotificationCenter::with_config(config.center_config());
    assert_eq!(center.thread_pool_size(), 3);
}

#[test]
fn test_invalid_configuration_reports_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[engine]\nworker-threads = 0\n").unwrap();

    let error = NotiflyConfig::load_from_file(&path).unwrap_err();
    let message = format!("{:#}", error);
    assert!(message.contains("broken.toml"), "unexpected error: {}", message);
    assert!(message.contains("worker-threads"), "unexpected error: {}", message);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let config = NotiflyConfig::from_toml_str("[engine]\nfuture-option = true\n").unwrap();
    assert_eq!(config, NotiflyConfig::default());
}
