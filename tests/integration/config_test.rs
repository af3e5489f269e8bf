//! Configuration loading from files and the process environment

use hubcollab::shared::config::CONFIG_PATH_ENV;
use hubcollab::shared::{AppConfig, ConfigError};
use serial_test::serial;
use std::io::Write;

const VARS: &[&str] = &[
    CONFIG_PATH_ENV,
    "HUBCOLLAB_BIND_ADDRESS",
    "HUBCOLLAB_PORT",
    "HUBCOLLAB_BROADCAST_CAPACITY",
    "HUBCOLLAB_HISTORY_RETENTION",
    "HUBCOLLAB_IDLE_SWEEP_SECS",
    "HUBCOLLAB_SNAPSHOT_INTERVAL",
    "DATABASE_URL",
    "RUST_LOG",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_load_defaults_without_environment() {
    clear_env();
    let config = crate::assert_ok!(AppConfig::load());
    assert_eq!(config, AppConfig::default());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 4100\nhistory_retention = 20\nlog_filter = \"debug\"").unwrap();

    std::env::set_var(CONFIG_PATH_ENV, file.path());
    std::env::set_var("HUBCOLLAB_PORT", "4200");
    std::env::set_var("DATABASE_URL", "sqlite://notes.db");

    let config = crate::assert_ok!(AppConfig::load());
    clear_env();

    assert_eq!(config.port, 4200);
    assert_eq!(config.history_retention, 20);
    assert_eq!(config.log_filter, "debug");
    assert_eq!(config.database_url.as_deref(), Some("sqlite://notes.db"));
}

#[test]
#[serial]
fn test_invalid_environment_value() {
    clear_env();
    std::env::set_var("HUBCOLLAB_BROADCAST_CAPACITY", "lots");
    let result = AppConfig::load();
    clear_env();

    crate::assert_err!(result, ConfigError::InvalidValue { .. });
}

#[test]
#[serial]
fn test_missing_config_file() {
    clear_env();
    std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/hubcollab.toml");
    let result = AppConfig::load();
    clear_env();

    crate::assert_err!(result, ConfigError::Io { .. });
}
