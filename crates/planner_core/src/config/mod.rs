use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::status::Urgency;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "PLANNER_CONFIG_PATH";

pub const DEFAULT_TICK_SECONDS: u64 = 60;

/// ANSI palette for the urgency dot and muted calendar text. The `plain`
/// theme keeps every sequence empty for dumb terminals.
#[derive(Debug, Clone)]
pub struct Palette {
    pub unscheduled: &'static str,
    pub due_soon: &'static str,
    pub overdue: &'static str,
    pub completed: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    /// Colored status dot, or empty when the theme carries no color; the
    /// caller prints the urgency label either way.
    pub fn urgency_dot(&self, urgency: Urgency) -> String {
        let color = match urgency {
            Urgency::Unscheduled => self.unscheduled,
            Urgency::DueSoon => self.due_soon,
            Urgency::Overdue => self.overdue,
            Urgency::Completed => self.completed,
        };
        if color.is_empty() {
            String::new()
        } else {
            format!("{color}\u{25cf}{}", self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match canonical_theme_name_option(theme).as_deref() {
        Some("plain") => Palette {
            unscheduled: "",
            due_soon: "",
            overdue: "",
            completed: "",
            muted: "",
            reset: "",
        },
        _ => Palette {
            unscheduled: "\x1b[38;5;245m",
            due_soon: "\x1b[38;5;220m",
            overdue: "\x1b[38;5;196m",
            completed: "\x1b[38;5;114m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
    }
}

fn canonical_theme_name_option(theme: Option<&str>) -> Option<String> {
    theme.and_then(canonical_theme_name)
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
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

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        return Some("default".into());
    }

    match trimmed {
        "color" | "colour" | "light" => Some("default".to_string()),
        "mono" | "none" | "no_color" | "nocolor" => Some("plain".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tick_seconds: Option<u64>,
}

impl Config {
    /// Interval between urgency re-evaluations; zero falls back to the
    /// default so a bad value cannot spin the ticker.
    pub fn tick_interval(&self) -> Duration {
        let seconds = match self.tick_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => DEFAULT_TICK_SECONDS,
        };
        Duration::from_secs(seconds)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
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
            .join("planner")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("planner")
            .join(CONFIG_FILE_NAME))
    }
}

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
        .map_err(|err| AppError::storage(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.as_deref().and_then(canonical_theme_name);
    Ok(config)
}
