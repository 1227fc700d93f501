use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Setting;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Provider access and query settings, the `[weather]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Setting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Setting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Setting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Setting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Setting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Setting>,
}

/// The `[server]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [weather]
/// api_url = "https://api.weather.yandex.ru/v2/forecast"
/// api_key = "..."
/// latitude = 55.75
/// longitude = 37.62
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl Config {
    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-proxy", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WEATHER_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overwrite settings with values found through `lookup`, keyed by
    /// environment variable name. Values are kept as text.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let w = &mut self.weather;

        if let Some(v) = lookup("WEATHER_API_URL") {
            w.api_url = Some(v);
        }
        if let Some(v) = lookup("WEATHER_API_KEY") {
            w.api_key = Some(v);
        }

        let settings: [(&str, &mut Option<Setting>); 6] = [
            ("WEATHER_LATITUDE", &mut w.latitude),
            ("WEATHER_LONGITUDE", &mut w.longitude),
            ("WEATHER_LANG", &mut w.lang),
            ("WEATHER_LIMIT", &mut w.limit),
            ("WEATHER_HOURS", &mut w.hours),
            ("WEATHER_EXTRA", &mut w.extra),
        ];
        for (key, slot) in settings {
            if let Some(v) = lookup(key) {
                *slot = Some(Setting::Text(v));
            }
        }

        if let Some(v) = lookup("WEATHER_BIND") {
            self.server.bind = v;
        }
    }
}
