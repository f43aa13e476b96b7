use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use client_core::{GatewayConfig, DEFAULT_SERVICE_URL};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "clauselens.toml";
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    /// Unset means requests may take as long as the service needs.
    pub request_timeout_seconds: Option<u64>,
    pub log_filter: String,
    pub command_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SERVICE_URL.into(),
            request_timeout_seconds: None,
            log_filter: "info".into(),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    request_timeout_seconds: Option<u64>,
    log_filter: Option<String>,
    command_queue_capacity: Option<usize>,
}

impl Settings {
    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.request_timeout_seconds {
            self.request_timeout_seconds = Some(v);
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
        if let Some(v) = file.command_queue_capacity {
            self.command_queue_capacity = v;
        }
    }

    /// Overlays environment variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CLAUSELENS_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("APP__API_URL") {
            self.api_url = v;
        }

        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
            match v.trim().parse::<u64>() {
                Ok(0) => self.request_timeout_seconds = None,
                Ok(parsed) => self.request_timeout_seconds = Some(parsed),
                Err(_) => {
                    tracing::warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECONDS")
                }
            }
        }

        if let Some(v) = lookup("APP__LOG_FILTER") {
            self.log_filter = v;
        }

        if let Some(v) = lookup("APP__COMMAND_QUEUE_CAPACITY") {
            match v.trim().parse::<usize>() {
                Ok(parsed) if parsed > 0 => self.command_queue_capacity = parsed,
                _ => tracing::warn!(value = %v, "ignoring invalid APP__COMMAND_QUEUE_CAPACITY"),
            }
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.api_url.trim().to_string(),
            request_timeout: self.request_timeout(),
        }
    }
}

/// Defaults, then `path` if it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    settings.apply_env(lookup);
    settings.command_queue_capacity = settings.command_queue_capacity.max(1);
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
