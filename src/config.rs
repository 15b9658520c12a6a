use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::{DEFAULT_API_BASE, DEFAULT_IMAGE_BASE};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "binhvietsub", "binh-cinema")
}

/// Directory for the key-value store and logs
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|p| p.data_dir().to_path_buf())
}

pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("config.json"))
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_image_base() -> String {
    DEFAULT_IMAGE_BASE.to_string()
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_instant_limit() -> usize {
    5
}
fn default_history_limit() -> usize {
    50
}
fn default_toast_ms() -> u64 {
    3000
}
fn default_player_command() -> String {
    "mpv".to_string()
}
fn default_player_args() -> Vec<String> {
    vec![
        "--force-window".to_string(),
        "--cache=yes".to_string(),
        "--msg-level=all=no".to_string(),
        "--hwdec=auto".to_string(),
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_image_base")]
    pub image_base_url: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_instant_limit")]
    pub instant_result_limit: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_toast_ms")]
    pub toast_duration_ms: u64,
    #[serde(default = "default_player_command")]
    pub player_command: String,
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Name shown on comments; blank posts as a guest
    #[serde(default)]
    pub comment_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            image_base_url: default_image_base(),
            debounce_ms: default_debounce_ms(),
            instant_result_limit: default_instant_limit(),
            history_limit: default_history_limit(),
            toast_duration_ms: default_toast_ms(),
            player_command: default_player_command(),
            player_args: default_player_args(),
            log_level: default_log_level(),
            comment_name: String::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, anyhow::Error> {
        if let Some(config_path) = config_path() {
            if config_path.exists() {
                let content = fs::read_to_string(config_path)?;
                let config: AppConfig = serde_json::from_str(&content)?;
                return Ok(config.sanitized());
            }
        }
        Ok(AppConfig::default())
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        if let Some(config_path) = config_path() {
            if let Some(dir) = config_path.parent() {
                fs::create_dir_all(dir)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(config_path, content)?;
        }
        Ok(())
    }

    /// Clamp values a hand-edited config could break the UI with
    pub fn sanitized(mut self) -> Self {
        if self.instant_result_limit == 0 {
            self.instant_result_limit = default_instant_limit();
        }
        if self.history_limit == 0 {
            self.history_limit = default_history_limit();
        }
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = default_api_base();
        }
        if self.player_command.trim().is_empty() {
            self.player_command = default_player_command();
        }
        self.debounce_ms = self.debounce_ms.min(5_000);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"debounce_ms": 150}"#).unwrap();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.instant_result_limit, 5);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.player_command, "mpv");
    }

    #[test]
    fn test_sanitized_repairs_zero_limits() {
        let config = AppConfig {
            instant_result_limit: 0,
            history_limit: 0,
            debounce_ms: 60_000,
            player_command: " ".into(),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.instant_result_limit, 5);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.debounce_ms, 5_000);
        assert_eq!(config.player_command, "mpv");
    }
}
