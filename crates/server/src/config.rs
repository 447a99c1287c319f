use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "server.toml";
pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub max_body_bytes: usize,
    pub cors_permissive: bool,
    #[serde(default = "default_events")]
    pub events: Vec<EventSettings>,
}

/// An event created at startup when it does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventSettings {
    pub id: String,
    pub capacity: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/registrations.db".into(),
            max_body_bytes: 16 * 1024,
            cors_permissive: false,
            events: default_events(),
        }
    }
}

fn default_events() -> Vec<EventSettings> {
    vec![EventSettings {
        id: "123".into(),
        capacity: 3,
    }]
}

pub fn load_settings() -> anyhow::Result<Settings> {
    build_settings(Path::new(CONFIG_FILE), std::env::vars().collect())
}

/// Layers defaults, the optional config file, a bare `DATABASE_URL` and finally
/// `APP__*` variables from `env`, later layers winning.
pub(crate) fn build_settings(
    config_file: &Path,
    env: HashMap<String, String>,
) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let bare_database_url: HashMap<String, String> = env
        .iter()
        .filter(|(key, _)| key.as_str() == "DATABASE_URL")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Config::builder()
        .set_default("bind_addr", defaults.bind_addr)?
        .set_default("database_url", defaults.database_url)?
        .set_default("max_body_bytes", defaults.max_body_bytes as i64)?
        .set_default("cors_permissive", defaults.cors_permissive)?
        .add_source(File::from(config_file).required(false))
        .add_source(Environment::default().source(Some(bare_database_url)))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .source(Some(env)),
        )
        .build()
        .with_context(|| format!("failed to read settings from '{}'", config_file.display()))?
        .try_deserialize()
        .context("invalid server settings")
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(parent) = sqlite_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
