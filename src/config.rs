use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the configured service URL.
pub const API_URL_ENV: &str = "MODISTA_API_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the chat service
    pub api_base_url: String,

    /// Request timeout for chat calls, in seconds
    pub request_timeout_secs: u64,

    /// Modista home directory
    pub modista_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let modista_home = home.join(".modista");

        Config {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
            modista_home,
            ui: UiConfig {
                show_timestamps: true,
                tick_rate_ms: 50,
            },
        }
    }
}

impl Config {
    /// Load configuration from file and apply environment overrides
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let modista_home = home.join(".modista");
        let config_path = modista_home.join("config.toml");

        // Ensure modista directory exists
        fs::create_dir_all(&modista_home)
            .context("Failed to create .modista directory")?;

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            // First run: materialize the defaults so they're easy to edit.
            let config = Config {
                modista_home: modista_home.clone(),
                ..Config::default()
            };
            config.save()?;
            config
        };

        config.modista_home = modista_home;

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.modista_home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Service URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let mut config = Config::default();
        config.api_base_url = "http://advice.example.com/".to_string();
        assert_eq!(config.base_url(), "http://advice.example.com");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.api_base_url, config.api_base_url);
        assert_eq!(parsed.ui.show_timestamps, config.ui.show_timestamps);
    }
}
