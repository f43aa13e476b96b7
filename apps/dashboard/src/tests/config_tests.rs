use super::{load_settings_with, Settings, DEFAULT_COMMAND_QUEUE_CAPACITY};

use std::{
    collections::HashMap,
    env, fs,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("clauselens_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("clauselens.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn missing_file_yields_defaults() {
    let path = env::temp_dir().join("clauselens_config_test_absent/clauselens.toml");
    let settings = load_settings_with(&path, env_of(&[])).expect("defaults");

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.api_url, "http://127.0.0.1:8000");
    assert_eq!(settings.request_timeout(), None);
    assert_eq!(settings.command_queue_capacity, DEFAULT_COMMAND_QUEUE_CAPACITY);
}

#[test]
fn file_values_are_overridden_by_environment() {
    let path = temp_config(
        r#"
api_url = "http://analysis.internal:9000"
request_timeout_seconds = 120
log_filter = "debug"
"#,
    );

    let settings = load_settings_with(
        &path,
        env_of(&[
            ("CLAUSELENS_API_URL", "http://ignored:1"),
            ("APP__API_URL", "https://lens.example.com/"),
            ("APP__COMMAND_QUEUE_CAPACITY", "8"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.api_url, "https://lens.example.com/");
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(120)));
    assert_eq!(settings.log_filter, "debug");
    assert_eq!(settings.command_queue_capacity, 8);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn malformed_file_is_an_error() {
    let path = temp_config("api_url = [not toml");
    let err = load_settings_with(&path, env_of(&[])).expect_err("parse failure");
    assert!(err.to_string().contains("failed to parse config file"));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn invalid_numeric_env_values_are_ignored() {
    let mut settings = Settings::default();
    settings.apply_env(env_of(&[
        ("APP__REQUEST_TIMEOUT_SECONDS", "soon"),
        ("APP__COMMAND_QUEUE_CAPACITY", "0"),
    ]));
    assert_eq!(settings, Settings::default());

    settings.apply_env(env_of(&[("APP__REQUEST_TIMEOUT_SECONDS", "0")]));
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn gateway_config_carries_url_and_timeout() {
    let settings = Settings {
        api_url: " http://localhost:8000 ".to_string(),
        request_timeout_seconds: Some(30),
        ..Settings::default()
    };
    let config = settings.gateway_config();
    assert_eq!(config.base_url, "http://localhost:8000");
    assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
}
