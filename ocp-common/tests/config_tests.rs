//! Config file resolution tests
//!
//! Tests that touch OCP_CONFIG are marked #[serial] so they don't race
//! on the process environment.

use ocp_common::config::{load_toml, load_toml_or_default, resolve_config_path, LoggingConfig};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct TestConfig {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    database_path: Option<PathBuf>,
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    env::set_var("OCP_CONFIG_TEST", "/tmp/from-env.toml");

    let path = resolve_config_path(None, "OCP_CONFIG_TEST");
    assert_eq!(path, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var("OCP_CONFIG_TEST");
}

#[test]
#[serial]
fn test_cli_arg_overrides_env_var() {
    env::set_var("OCP_CONFIG_TEST", "/tmp/from-env.toml");

    let path = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")), "OCP_CONFIG_TEST");
    assert_eq!(path, Some(PathBuf::from("/tmp/from-cli.toml")));

    env::remove_var("OCP_CONFIG_TEST");
}

#[test]
fn test_load_valid_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
database_path = "/var/lib/ocp/test.db"

[logging]
level = "debug"
"#
    )
    .unwrap();

    let config: TestConfig = load_toml(file.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/ocp/test.db")));
}

#[test]
fn test_malformed_toml_degrades_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is = = not toml").unwrap();

    assert!(load_toml::<TestConfig>(file.path()).is_err());

    let config: TestConfig = load_toml_or_default(Some(file.path()));
    assert_eq!(config.logging.level, "info");
    assert!(config.database_path.is_none());
}
