// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::time::Duration;

use tempfile::tempdir;

use pipeline_console::config::{load_and_validate, load_from_path, load_or_default};
use pipeline_console::errors::ConsoleError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn full_file_is_loaded() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Console.toml");
    fs::write(
        &path,
        r#"
[server]
api_url = "https://pipeline.example.com"
ws_url = "wss://pipeline.example.com"

[connection]
reconnect_delay_ms = 1500
connect_timeout_ms = 2000
event_capacity = 32

[logs]
capacity = 100
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.server.api_url, "https://pipeline.example.com");
    assert_eq!(cfg.server.ws_url, "wss://pipeline.example.com");
    assert_eq!(cfg.connection.reconnect_delay(), Duration::from_millis(1500));
    assert_eq!(cfg.connection.connect_timeout(), Duration::from_secs(2));
    assert_eq!(cfg.connection.event_capacity, 32);
    assert_eq!(cfg.logs.capacity, 100);
    Ok(())
}

#[test]
fn missing_sections_use_defaults() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Console.toml");
    fs::write(&path, "[logs]\ncapacity = 10\n")?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.logs.capacity, 10);
    assert_eq!(cfg.connection.reconnect_delay(), Duration::from_secs(3));
    assert_eq!(cfg.connection.connect_timeout(), Duration::from_secs(10));
    Ok(())
}

#[test]
fn missing_default_file_yields_defaults() -> TestResult {
    let dir = tempdir()?;
    let cfg = load_or_default(dir.path().join("Console.toml"))?;
    assert_eq!(cfg.logs.capacity, 500);
    assert_eq!(cfg.connection.event_capacity, 256);
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConsoleError::IoError(_)), "{err}");
}

#[test]
fn invalid_toml_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Console.toml");
    fs::write(&path, "[logs\ncapacity = ")?;
    assert!(matches!(
        load_from_path(&path),
        Err(ConsoleError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn wrong_url_scheme_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Console.toml");
    fs::write(&path, "[server]\nws_url = \"http://localhost:8000\"\n")?;

    let err = load_and_validate(&path).unwrap_err();
    let ConsoleError::ConfigError(msg) = err else {
        panic!("expected a config error, got {err}");
    };
    assert!(msg.contains("[server].ws_url"), "{msg}");
    Ok(())
}

#[test]
fn zero_capacity_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Console.toml");
    fs::write(&path, "[logs]\ncapacity = 0\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(err.to_string().contains("[logs].capacity must be >= 1"), "{err}");
    Ok(())
}
