//! Configuration loading for NeuroFusion.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Wake word used when none is configured.
pub const DEFAULT_WAKE_WORD: &str = "neuro";

/// Longest utterance the executor accepts, in characters.
pub const DEFAULT_MAX_COMMAND_LENGTH: usize = 1000;

/// Themes the web front end knows how to render.
pub const THEMES: &[&str] = &["light", "dark"];

/// Get the NeuroFusion home directory (~/.neurofusion).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".neurofusion"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("config.json"))
}

/// Web server configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Web {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_max_concurrent_commands")]
    pub max_concurrent_commands: usize,
}

fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

fn default_web_port() -> u16 {
    8000
}

fn default_max_concurrent_commands() -> usize {
    16
}

impl Default for Web {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            max_concurrent_commands: default_max_concurrent_commands(),
        }
    }
}

/// Background loop configuration. Intervals are in seconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Monitoring {
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// Shell command run by the refresh loop, e.g. a package upgrade.
    #[serde(default)]
    pub refresh_command: Option<String>,
}

fn default_health_check_interval() -> u64 {
    3600
}

fn default_refresh_interval() -> u64 {
    86400
}

impl Default for Monitoring {
    fn default() -> Self {
        Self {
            health_check_interval: default_health_check_interval(),
            refresh_interval: default_refresh_interval(),
            refresh_command: None,
        }
    }
}

/// Opt-in capabilities that cross a trust boundary.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Features {
    /// Enables `run <command>`, which hands the text to the system shell.
    #[serde(default)]
    pub allow_shell_commands: bool,
}

/// Remote lookup endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lookup {
    #[serde(default = "default_geo_url")]
    pub geo_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

fn default_geo_url() -> String {
    "https://ipinfo.io/json".to_string()
}

fn default_weather_url() -> String {
    "https://wttr.in".to_string()
}

fn default_lookup_timeout() -> u64 {
    10
}

impl Default for Lookup {
    fn default() -> Self {
        Self {
            geo_url: default_geo_url(),
            weather_url: default_weather_url(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

/// NeuroFusion settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    #[serde(default = "default_wake_word")]
    pub wake_word: String,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_max_command_length")]
    pub max_command_length: usize,

    /// Where screenshots land; `~/.neurofusion/screenshots` when unset.
    #[serde(default)]
    pub screenshot_dir: Option<PathBuf>,

    #[serde(default)]
    pub web: Web,

    #[serde(default)]
    pub monitoring: Monitoring,

    #[serde(default)]
    pub features: Features,

    #[serde(default)]
    pub lookup: Lookup,
}

fn default_wake_word() -> String {
    DEFAULT_WAKE_WORD.to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_max_command_length() -> usize {
    DEFAULT_MAX_COMMAND_LENGTH
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wake_word: default_wake_word(),
            theme: default_theme(),
            max_command_length: default_max_command_length(),
            screenshot_dir: None,
            web: Web::default(),
            monitoring: Monitoring::default(),
            features: Features::default(),
            lookup: Lookup::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, writing defaults back when the file is
    /// missing or cannot be parsed.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => {
                    tracing::debug!("Loaded settings from {}", path.display());
                    return Ok(settings);
                }
                Err(e) => {
                    tracing::warn!(
                        "Settings at {} are unreadable ({}), restoring defaults",
                        path.display(),
                        e
                    );
                }
            }
        } else {
            tracing::info!("No settings at {}, creating defaults", path.display());
        }

        let settings = Settings::default();
        settings.save(path)?;
        Ok(settings)
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Apply a partial update. Nothing is changed when validation fails.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Result<()> {
        if let Some(wake_word) = &update.wake_word {
            if wake_word.trim().is_empty() {
                return Err(Error::Config("wake_word must not be empty".to_string()));
            }
        }
        if let Some(theme) = &update.theme {
            if !THEMES.contains(&theme.as_str()) {
                return Err(Error::Config(format!(
                    "Unknown theme '{}'. Use one of: {}",
                    theme,
                    THEMES.join(", ")
                )));
            }
        }

        if let Some(wake_word) = &update.wake_word {
            self.wake_word = wake_word.trim().to_lowercase();
        }
        if let Some(theme) = &update.theme {
            self.theme = theme.clone();
        }
        Ok(())
    }

    /// Resolve the screenshot directory.
    pub fn screenshot_dir(&self) -> Result<PathBuf> {
        match &self.screenshot_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_home_dir()?.join("screenshots")),
        }
    }
}

/// Fields the settings surface may change.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SettingsUpdate {
    pub wake_word: Option<String>,
    pub theme: Option<String>,
}
