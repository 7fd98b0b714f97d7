//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `--config <path>` on the command line
//! 2. `$SEXTANT_CONFIG` environment variable
//! 3. `~/.config/sextant/config.toml`
//! 4. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sextant_core::Units;
use sextant_weather::ClientConfig;

/// Overrides `weather.api_key` when set.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub favourites: FavouritesConfig,
    pub log: LogConfig,
    pub plot: PlotConfig,
}

/// OpenWeatherMap access.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub forecast_url: String,
    pub one_call_url: String,
    /// Units for `weather current` when `--units` is not given.
    pub units: Units,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

/// Favourite cities file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FavouritesConfig {
    /// JSON file path. Default: platform-specific data dir.
    pub path: Option<String>,
}

/// Log file settings. Stderr logging is controlled by `-v` and `RUST_LOG`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: Option<String>,
    pub level: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Directory for SVG plots. Default: `plots/` under the data dir.
    pub output_dir: Option<String>,
}

// --- Defaults ---

impl Default for WeatherConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            api_key: None,
            base_url: client.base_url,
            forecast_url: client.forecast_url,
            one_call_url: client.one_call_url,
            units: Units::default(),
            timeout_secs: client.timeout.as_secs(),
            retries: client.retries,
            retry_delay_ms: client.retry_delay.as_millis() as u64,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            level: "info".into(),
        }
    }
}

impl WeatherConfig {
    /// Client settings, with `env_key` (the value of `$OPENWEATHER_API_KEY`)
    /// taking precedence over the configured key.
    pub fn client_config(&self, env_key: Option<String>) -> ClientConfig {
        let api_key = env_key
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
            .unwrap_or_default();
        ClientConfig {
            api_key,
            base_url: self.base_url.clone(),
            forecast_url: self.forecast_url.clone(),
            one_call_url: self.one_call_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists; an
/// explicitly requested file must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(p) = explicit {
        if !p.exists() {
            bail!("config file {} does not exist", p.display());
        }
    }

    if let Some(p) = config_path(explicit) {
        if p.exists() {
            let content =
                std::fs::read_to_string(&p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    if let Ok(p) = std::env::var("SEXTANT_CONFIG") {
        return Some(PathBuf::from(p));
    }

    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("sextant")
            .join("config.toml")
    })
}

/// Show the active config path (for `sextant config`).
pub fn show_config_path(explicit: Option<&Path>) -> String {
    match config_path(explicit) {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
