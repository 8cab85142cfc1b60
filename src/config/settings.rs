use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the warehouse backend (includes any path prefix)
    pub api_base_url: String,
    /// Per-request timeout for backend calls, in seconds
    pub request_timeout_secs: u64,
    /// Allow opening a packout session against a degraded (offline-synthesized)
    /// order lookup result
    pub allow_degraded_lookup: bool,
}

/// TOML representation of the config file (all fields optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub api: Option<TomlApiConfig>,
    pub lookup: Option<TomlLookupConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlApiConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlLookupConfig {
    pub allow_degraded: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            allow_degraded_lookup: false,
        }
    }
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let mut config = Config::default();

        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        // Try to load user config
        if config_file.exists() {
            if let Ok(contents) = fs::read_to_string(&config_file) {
                match toml::from_str::<TomlConfig>(&contents) {
                    Ok(toml_config) => {
                        if let Some(api) = toml_config.api {
                            if let Some(base_url) = api.base_url {
                                config.api_base_url = base_url;
                            }
                            if let Some(timeout) = api.request_timeout_secs {
                                config.request_timeout_secs = timeout;
                            }
                        }
                        if let Some(lookup) = toml_config.lookup {
                            if let Some(allow) = lookup.allow_degraded {
                                config.allow_degraded_lookup = allow;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %config_file.display(),
                            error = %e,
                            "Ignoring malformed config file"
                        );
                    }
                }
            }
        }

        // Trailing slashes break path joining in the client
        while config.api_base_url.ends_with('/') {
            config.api_base_url.pop();
        }

        config
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!("Failed to create config directory: {}", e);
                    return;
                }
            }
        }

        // Write the example config
        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            eprintln!("Failed to write default config: {}", e);
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        while self.api_base_url.ends_with('/') {
            self.api_base_url.pop();
        }
        self
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
