//! Configuration structures and loading logic.


use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::search::MatcherKind;

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub watcher: WatcherConfig,
    pub colors: ColorConfig,
}

/// Search behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period between a keystroke and the re-annotate pass.
    pub debounce_ms: u64,
    /// Matcher kind a fresh session starts with.
    pub default_mode: MatcherKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            default_mode: MatcherKind::SmartCase,
        }
    }
}

/// File watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub enabled: bool,
    /// Drain window for bursts of filesystem events.
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 200,
        }
    }
}

/// Highlight colors for the terminal renderer. Values are named ANSI
/// colors: black, red, green, yellow, blue, magenta, cyan, white.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Background of an ordinary match span.
    pub match_bg: String,
    /// Background of the focused match span.
    pub current_bg: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            match_bg: "yellow".to_string(),
            current_bg: "cyan".to_string(),
        }
    }
}

/// Directory holding the config file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mdpeek")
}

/// Full path of the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Loads the config from the default location. A missing file yields the
/// defaults; an unparsable file yields the defaults with a warning.
pub fn load() -> Config {
    load_from(&config_path())
}

/// Loads the config from an explicit path.
pub fn load_from(path: &Path) -> Config {
    let Ok(source) = std::fs::read_to_string(path) else {
        log::debug!("no config at {}, using defaults", path.display());
        return Config::default();
    };
    match toml::from_str(&source) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("failed to parse {}: {err}", path.display());
            Config::default()
        }
    }
}
