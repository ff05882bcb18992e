//! Configuration loading tests
//!
//! Covers the resolution order (explicit path, `VEIL_CONFIG`, platform
//! file, compiled defaults) and validation of loaded files.
//!
//! Note: tests touching `VEIL_CONFIG` are marked #[serial] so they do not
//! race on the process environment.

use std::env;
use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;
use veil_common::config::{PlayerConfig, SkinKind, CONFIG_ENV_VAR};
use veil_common::Error;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config(
        r#"
skin = "minimal"

[timing]
sync_interval_ms = 250
"#,
    );

    let config = PlayerConfig::load_from_path(file.path()).unwrap();
    assert_eq!(config.skin, SkinKind::Minimal);
    assert_eq!(config.timing.sync_interval_ms, 250);
    assert_eq!(config.timing.hide_controls_after_ms, 3000);
    assert_eq!(config.watermark, PlayerConfig::default().watermark);
    assert_eq!(config.blockers.len(), 3);
}

#[test]
fn test_blockers_are_configuration() {
    let file = write_config(
        r#"
[[blockers]]
name = "corner"
left_percent = 80.0
top_percent = 0.0
width_percent = 20.0
height_percent = 10.0
"#,
    );

    let config = PlayerConfig::load_from_path(file.path()).unwrap();
    assert_eq!(config.blockers.len(), 1);
    assert_eq!(config.blockers[0].name, "corner");
}

#[test]
fn test_invalid_ranges_rejected() {
    let file = write_config(
        r#"
[watermark]
min_count = 6
max_count = 2
"#,
    );
    assert!(matches!(
        PlayerConfig::load_from_path(file.path()),
        Err(Error::Config(_))
    ));

    let file = write_config("playback_rates = []\n");
    assert!(matches!(
        PlayerConfig::load_from_path(file.path()),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_malformed_toml_is_an_error() {
    let file = write_config("[timing\nsync_interval_ms = ");
    assert!(matches!(
        PlayerConfig::load_from_path(file.path()),
        Err(Error::Toml(_))
    ));
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    let from_cli = write_config("skin = \"share\"\n");
    let from_env = write_config("skin = \"minimal\"\n");
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = PlayerConfig::load(Some(from_cli.path())).unwrap();
    assert_eq!(config.skin, SkinKind::Share);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    let from_env = write_config("skin = \"minimal\"\n");
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = PlayerConfig::load(None).unwrap();
    assert_eq!(config.skin, SkinKind::Minimal);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_env_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    env::set_var(CONFIG_ENV_VAR, dir.path().join("absent.toml"));

    assert!(matches!(PlayerConfig::load(None), Err(Error::Io(_))));

    env::remove_var(CONFIG_ENV_VAR);
}
