use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::ClientOptions;

pub const SETTINGS_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub cluster_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
    pub debounce_ms: u64,
    pub page_size: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            cluster_url: "http://127.0.0.1:9200".into(),
            username: None,
            password: None,
            request_timeout_secs: 30,
            debounce_ms: 500,
            page_size: 20,
        }
    }
}

impl ConsoleSettings {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            cluster_url: self.cluster_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Defaults, then `console.toml` in the working directory, then the environment.
pub fn load_settings() -> anyhow::Result<ConsoleSettings> {
    let mut settings = ConsoleSettings::default();
    let path = Path::new(SETTINGS_FILE);
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        apply_file(&mut settings, &raw)?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut ConsoleSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)
        .with_context(|| format!("'{SETTINGS_FILE}' is not valid TOML"))?;
    for (key, value) in file_cfg {
        let value = match value {
            toml::Value::String(text) => text,
            other => other.to_string(),
        };
        apply_key(settings, &key, value);
    }
    Ok(())
}

fn apply_env(settings: &mut ConsoleSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CLUSTER_URL") {
        settings.cluster_url = v;
    }
    for key in [
        "cluster_url",
        "username",
        "password",
        "request_timeout_secs",
        "debounce_ms",
        "page_size",
    ] {
        if let Some(v) = var(&format!("APP__{}", key.to_ascii_uppercase())) {
            apply_key(settings, key, v);
        }
    }
}

fn apply_key(settings: &mut ConsoleSettings, key: &str, value: String) {
    match key {
        "cluster_url" => settings.cluster_url = value,
        "username" => settings.username = Some(value),
        "password" => settings.password = Some(value),
        "request_timeout_secs" => {
            if let Ok(parsed) = value.parse() {
                settings.request_timeout_secs = parsed;
            }
        }
        "debounce_ms" => {
            if let Ok(parsed) = value.parse() {
                settings.debounce_ms = parsed;
            }
        }
        "page_size" => {
            if let Ok(parsed) = value.parse::<usize>() {
                if parsed > 0 {
                    settings.page_size = parsed;
                }
            }
        }
        _ => tracing::debug!(key, "ignoring unknown setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
