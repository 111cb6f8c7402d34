//! Configuration resolution and graceful degradation tests
//!
//! Tests that manipulate process environment variables are marked #[serial]
//! so they never run in parallel with each other.

use documind_common::config::{
    config_file_path, resolve_parsed, resolve_string, TomlConfig, CONFIG_PATH_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var("DOCUMIND_TEST_OPENAI_KEY", "from-env");

    let value = resolve_string(None, "DOCUMIND_TEST_OPENAI_KEY", Some("from-toml"));
    assert_eq!(value.as_deref(), Some("from-env"));

    env::remove_var("DOCUMIND_TEST_OPENAI_KEY");
}

#[test]
#[serial]
fn test_toml_used_when_env_unset() {
    env::remove_var("DOCUMIND_TEST_OPENAI_KEY");

    let value = resolve_string(None, "DOCUMIND_TEST_OPENAI_KEY", Some("from-toml"));
    assert_eq!(value.as_deref(), Some("from-toml"));

    let none = resolve_string(None, "DOCUMIND_TEST_OPENAI_KEY", None);
    assert!(none.is_none());
}

#[test]
#[serial]
fn test_blank_env_value_is_ignored() {
    env::set_var("DOCUMIND_TEST_OPENAI_KEY", "   ");

    let value = resolve_string(None, "DOCUMIND_TEST_OPENAI_KEY", Some("from-toml"));
    assert_eq!(value.as_deref(), Some("from-toml"));

    env::remove_var("DOCUMIND_TEST_OPENAI_KEY");
}

#[test]
#[serial]
fn test_unparsable_env_port_falls_back() {
    env::set_var("DOCUMIND_TEST_PORT", "not-a-port");
    let port: u16 = resolve_parsed(None, "DOCUMIND_TEST_PORT", Some(9000), 8000);
    assert_eq!(port, 9000);

    env::set_var("DOCUMIND_TEST_PORT", "7000");
    let port: u16 = resolve_parsed(None, "DOCUMIND_TEST_PORT", Some(9000), 8000);
    assert_eq!(port, 7000);

    env::remove_var("DOCUMIND_TEST_PORT");
    let port: u16 = resolve_parsed(None, "DOCUMIND_TEST_PORT", None, 8000);
    assert_eq!(port, 8000);
}

#[test]
#[serial]
fn test_config_path_from_env() {
    env::set_var(CONFIG_PATH_ENV, "/tmp/documind-test/custom.toml");
    assert_eq!(
        config_file_path(),
        Some(PathBuf::from("/tmp/documind-test/custom.toml"))
    );
    env::remove_var(CONFIG_PATH_ENV);

    if let Some(path) = config_file_path() {
        assert!(path.ends_with("documind/documind.toml"));
    }
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load_or_default(Some(&dir.path().join("absent.toml")));

    assert!(config.server.port.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    assert!(TomlConfig::load(&path).is_err());
    let config = TomlConfig::load_or_default(Some(&path));
    assert!(config.server.port.is_none());
}

#[test]
fn test_write_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("documind.toml");

    let mut config = TomlConfig::default();
    config.server.port = Some(8123);
    config.sanity.dataset = Some("staging".to_string());
    config.write(&path).unwrap();

    let loaded = TomlConfig::load(&path).unwrap();
    assert_eq!(loaded.server.port, Some(8123));
    assert_eq!(loaded.sanity.dataset.as_deref(), Some("staging"));
    assert!(!path.with_extension("toml.tmp").exists());
}
