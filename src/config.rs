use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

/// Overrides the directory holding `config.toml` and `session.json`
pub(crate) const CONFIG_DIR_ENV: &str = "FITCHECK_CONFIG_DIR";

#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) predict_url: Option<String>,
    #[serde(default)]
    pub(crate) service_url: Option<String>,
    #[serde(default)]
    pub(crate) service_key: Option<String>,
    #[serde(default)]
    pub(crate) clothes_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) downloads_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) create_dir: bool,
    #[serde(default)]
    pub(crate) no_color: bool,
}

impl Config {
    /// First parseable config file, then environment overrides on top.
    pub(crate) fn load() -> Self {
        Self::load_file().with_env()
    }

    fn load_file() -> Self {
        for path in Self::get_config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        info!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to parse config");
                    }
                }
            }
        }

        Self::default()
    }

    fn with_env(mut self) -> Self {
        if let Some(v) = env_var("FITCHECK_PREDICT_URL") {
            self.predict_url = Some(v);
        }
        if let Some(v) = env_var("FITCHECK_SERVICE_URL") {
            self.service_url = Some(v);
        }
        if let Some(v) = env_var("FITCHECK_SERVICE_KEY") {
            self.service_key = Some(v);
        }
        if let Some(v) = env_var("FITCHECK_CLOTHES") {
            self.clothes_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env_var("FITCHECK_DOWNLOADS") {
            self.downloads_dir = Some(PathBuf::from(v));
        }
        self
    }

    /// Directory for the session file and the primary config file
    pub(crate) fn state_dir() -> PathBuf {
        if let Some(dir) = env_var(CONFIG_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".config").join("fitcheck");
        }
        dirs::config_dir()
            .map(|d| d.join("fitcheck"))
            .unwrap_or_else(|| PathBuf::from(".fitcheck"))
    }

    fn get_config_paths() -> Vec<PathBuf> {
        // An explicit state dir wins outright.
        if let Some(dir) = env_var(CONFIG_DIR_ENV) {
            return vec![PathBuf::from(dir).join("config.toml")];
        }

        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/fitcheck/config.toml (Linux/cross-platform)
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("fitcheck").join("config.toml"));
        }

        // 2. macOS Application Support: ~/Library/Application Support/fitcheck/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let macos_path = config_dir.join("fitcheck").join("config.toml");
            if !paths.contains(&macos_path) {
                paths.push(macos_path);
            }
        }

        // 3. Home directory: ~/.fitcheck.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".fitcheck.toml"));
        }

        paths
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
