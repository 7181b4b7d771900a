use crate::error::AppError;
use crate::store::DEFAULT_ASSIGNEE;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKPAD_CONFIG_PATH";
const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 900;
const DEFAULT_LOG_LEVEL: &str = "warn";

/// ANSI styles used when printing tasks. Empty codes print text unstyled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
}

const ANSI_RESET: &str = "\x1b[0m";

impl Palette {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn accentize(&self, text: &str) -> String {
        paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        paint(self.muted, text)
    }
}

fn paint(code: &str, text: &str) -> String {
    if code.is_empty() {
        text.to_string()
    } else {
        format!("{code}{text}{ANSI_RESET}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Plain,
    Noir,
    Solarized,
}

impl Theme {
    /// Resolves a user-supplied theme name; `None` for names we do not ship.
    pub fn from_name(raw: &str) -> Option<Self> {
        match canonical_key(raw).as_str() {
            "" | "plain" | "default" => Some(Self::Plain),
            "noir" | "dark" => Some(Self::Noir),
            "solarized" => Some(Self::Solarized),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Noir => "noir",
            Self::Solarized => "solarized",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Plain => Palette::plain(),
            Self::Noir => Palette {
                accent: "\x1b[38;5;208m",
                muted: "\x1b[38;5;250m",
            },
            Self::Solarized => Palette {
                accent: "\x1b[38;5;108m",
                muted: "\x1b[38;5;246m",
            },
        }
    }
}

/// Lowercases and collapses every run of non-alphanumerics into one `_`.
pub fn canonical_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub autosave_delay_ms: Option<u64>,
    #[serde(default)]
    pub default_assignee: Option<String>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

impl Config {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms.unwrap_or(DEFAULT_AUTOSAVE_DELAY_MS))
    }

    pub fn default_assignee(&self) -> &str {
        self.default_assignee
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ASSIGNEE)
    }

    /// Unknown theme names fall back to plain output.
    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::from_name)
            .unwrap_or_default()
    }

    pub fn palette(&self) -> Palette {
        self.theme().palette()
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Expands `first` through the alias table, if it names an alias.
    pub fn expand_alias(&self, first: &str) -> Option<Vec<String>> {
        self.aliases.get(first).map(|expansion| {
            expansion
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub aliases: HashMap<String, String>,
    pub autosave_delay_ms: Option<u64>,
    pub default_assignee: Option<String>,
    pub log_level: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskpad")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskpad")
            .join(CONFIG_FILE_NAME))
    }
}

/// Loads the config file, falling back to defaults. A missing file is not an
/// error; an unreadable one is reported alongside the defaults.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_theme(config))
}

fn normalize_theme(mut config: Config) -> Config {
    if let Some(name) = config.theme.take() {
        match Theme::from_name(&name) {
            Some(theme) => config.theme = Some(theme.name().to_string()),
            None => warn!("event=config_load module=config status=unknown_theme theme={name}"),
        }
    }
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref().and_then(Theme::from_name) {
        merged.theme = Some(theme.name().to_string());
    }

    for (alias, value) in overrides.aliases.iter() {
        merged.aliases.insert(alias.clone(), value.clone());
    }

    if let Some(delay) = overrides.autosave_delay_ms {
        merged.autosave_delay_ms = Some(delay);
    }
    if let Some(assignee) = overrides.default_assignee.as_ref() {
        merged.default_assignee = Some(assignee.clone());
    }
    if let Some(level) = overrides.log_level.as_ref() {
        merged.log_level = Some(level.clone());
    }

    merged
}
