//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Application settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Backend base URL (e.g., "https://api.tropictrek.com")
    pub api_url: Option<String>,
    /// Directory downloaded itineraries are written to
    pub download_dir: Option<PathBuf>,
    /// Maximum number of characters accepted in the message box
    pub max_input_chars: Option<usize>,
    /// Per-request timeout for backend calls
    pub request_timeout_secs: Option<u64>,
    /// Check image URLs in replies so broken ones render as placeholders
    pub probe_images: Option<bool>,
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Values given on the command line (or through the environment via clap).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub download_dir: Option<PathBuf>,
}

/// Fully resolved configuration: overrides, then settings file, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub download_dir: PathBuf,
    pub max_input_chars: usize,
    pub request_timeout: Duration,
    pub probe_images: bool,
}

impl AppConfig {
    pub fn resolve(settings: &Settings, overrides: Overrides) -> Self {
        let api_url = overrides
            .api_url
            .filter(|url| !url.trim().is_empty())
            .or_else(|| settings.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let download_dir = overrides
            .download_dir
            .or_else(|| settings.download_dir.clone())
            .or_else(PathManager::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            download_dir,
            max_input_chars: settings
                .max_input_chars
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_INPUT_CHARS),
            request_timeout: Duration::from_secs(
                settings
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            probe_images: settings.probe_images.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = AppConfig::resolve(
            &Settings::default(),
            Overrides {
                download_dir: Some(PathBuf::from("/tmp/trek")),
                ..Default::default()
            },
        );
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.max_input_chars, DEFAULT_MAX_INPUT_CHARS);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.probe_images);
    }

    #[test]
    fn test_override_beats_settings_file() {
        let settings = Settings {
            api_url: Some("http://settings:9000".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(
            &settings,
            Overrides {
                api_url: Some("https://api.example.com/".to_string()),
                download_dir: Some(PathBuf::from("/tmp")),
            },
        );
        assert_eq!(config.api_url, "https://api.example.com");

        let config = AppConfig::resolve(&settings, Overrides::default());
        assert_eq!(config.api_url, "http://settings:9000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "api_url = \"http://trek.local\"\nmax_input_chars = 250\nprobe_images = false\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url.as_deref(), Some("http://trek.local"));
        assert_eq!(settings.max_input_chars, Some(250));
        assert_eq!(settings.probe_images, Some(false));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = [not toml").unwrap();

        assert_eq!(Settings::load_from(&path), Settings::default());
        assert_eq!(Settings::load_from(&dir.path().join("missing.toml")), Settings::default());
    }
}
