use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const APP_DIR_NAME: &str = "clickgate";

const POLL_INTERVAL_RANGE: (u64, u64) = (50, 10_000);
const CLICK_COOLDOWN_RANGE: (u64, u64) = (0, 300_000);

/// Engine configuration. Immutable once handed to the engine; a reload
/// builds a new value and swaps it in whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub allowed_processes: Vec<String>,
    pub allowed_window_title_contains: Vec<String>,
    pub button_texts: Vec<String>,
    pub poll_interval_ms: u64,
    pub click_cooldown_ms: u64,
    pub require_button_enabled: bool,
    pub require_near_text_contains: Vec<String>,
    pub allow_focus: bool,
    pub dry_run: bool,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allowed_processes: default_processes(),
            allowed_window_title_contains: default_titles(),
            button_texts: default_buttons(),
            poll_interval_ms: 350,
            click_cooldown_ms: 5000,
            require_button_enabled: true,
            require_near_text_contains: Vec::new(),
            allow_focus: false,
            dry_run: true,
            log_level: "INFO".into(),
        }
    }
}

fn default_processes() -> Vec<String> {
    vec!["Code.exe".into()]
}

fn default_titles() -> Vec<String> {
    vec!["Visual Studio Code".into(), "CODEx".into(), "Copilot".into()]
}

fn default_buttons() -> Vec<String> {
    ["Submit", "Continue", "Apply", "Yes"].iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Load from `path`, writing a default file first if none exists.
    /// Unreadable or malformed content yields defaults; individual bad
    /// fields fall back or clamp without affecting the others.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            if let Err(e) = Self::default().save(path) {
                crate::logger::warn(&format!("could not write default settings: {:#}", e));
            }
        }

        let raw = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<Value>(&s).ok());

        match raw {
            Some(Value::Object(map)) => Self::from_map(&map),
            _ => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            allowed_processes: string_list(map.get("allowed_processes"))
                .unwrap_or(d.allowed_processes),
            allowed_window_title_contains: string_list(map.get("allowed_window_title_contains"))
                .unwrap_or(d.allowed_window_title_contains),
            button_texts: string_list(map.get("button_texts")).unwrap_or(d.button_texts),
            poll_interval_ms: clamped_int(map.get("poll_interval_ms"), POLL_INTERVAL_RANGE)
                .unwrap_or(d.poll_interval_ms),
            click_cooldown_ms: clamped_int(map.get("click_cooldown_ms"), CLICK_COOLDOWN_RANGE)
                .unwrap_or(d.click_cooldown_ms),
            require_button_enabled: flag(map.get("require_button_enabled"))
                .unwrap_or(d.require_button_enabled),
            require_near_text_contains: optional_string_list(map.get("require_near_text_contains")),
            allow_focus: flag(map.get("allow_focus")).unwrap_or(d.allow_focus),
            dry_run: flag(map.get("dry_run")).unwrap_or(d.dry_run),
            log_level: map
                .get("log_level")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .unwrap_or(d.log_level),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn click_cooldown(&self) -> Duration {
        Duration::from_millis(self.click_cooldown_ms)
    }
}

fn trimmed_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// `None` unless the value is a list with at least one non-blank entry.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let Some(Value::Array(items)) = value else { return None };
    let cleaned = trimmed_strings(items);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn optional_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => trimmed_strings(items),
        _ => Vec::new(),
    }
}

fn clamped_int(value: Option<&Value>, (min, max): (u64, u64)) -> Option<u64> {
    let parsed = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(parsed.clamp(min as i64, max as i64) as u64)
}

fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn default_settings_path() -> PathBuf {
    app_dir().join("settings.json")
}

pub fn default_log_dir() -> PathBuf {
    app_dir().join("logs")
}
