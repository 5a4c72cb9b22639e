//! Configuration management for the itinerary planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// OpenTripMap place search
    pub places: PlacesConfig,
    /// OpenWeatherMap current conditions
    pub weather: WeatherConfig,
    /// Hugging Face text generation
    pub text_generation: TextGenerationConfig,
    /// Document store
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Tunable content heuristics
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Place search API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// OpenTripMap API key. Place endpoints report "not configured" without it.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Text generation API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGenerationConfig {
    /// Hugging Face token. Without it every description comes from templates.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model path appended to the base URL
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Sampling temperature
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// MongoDB connection string. The in-memory store is used when unset.
    pub mongodb_uri: Option<String>,
    pub database: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Descriptions shorter than this many characters get a generated companion
    pub min_description_length: usize,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_places_base_url() -> String {
    "https://api.opentripmap.com/0.1/en/places".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_upstream_timeout() -> u32 {
    15
}

fn default_text_base_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_text_model() -> String {
    "gpt2".to_string()
}

fn default_text_timeout() -> u32 {
    30
}

fn default_text_temperature() -> f32 {
    0.7
}

fn default_database() -> String {
    "travel_planner".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_min_description_length() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_places_base_url(),
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_text_base_url(),
            model: default_text_model(),
            timeout_seconds: default_text_timeout(),
            temperature: default_text_temperature(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: None,
            database: default_database(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_description_length: default_min_description_length(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // PLANNER_SERVER__PORT=8080 style overrides
        builder = builder.add_source(
            Environment::with_prefix("PLANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_env_fallbacks(|name| std::env::var(name).ok());
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("itinerary-planner").join("config.toml"))
    }

    /// Fill still-unset values from the flat variable names used by existing
    /// deployments (`OPENTRIPMAP_API_KEY`, `MONGODB_URI`, ...). Empty values are ignored.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if self.places.api_key.is_none() {
            self.places.api_key = lookup("OPENTRIPMAP_API_KEY");
        }
        if self.weather.api_key.is_none() {
            self.weather.api_key = lookup("WEATHER_API_KEY");
        }
        if self.text_generation.api_key.is_none() {
            self.text_generation.api_key = lookup("HUGGINGFACE_API_KEY");
        }
        if self.storage.mongodb_uri.is_none() {
            self.storage.mongodb_uri = lookup("MONGODB_URI");
        }
        if let Some(database) = lookup("MONGODB_DB_NAME") {
            if self.storage.database == default_database() {
                self.storage.database = database;
            }
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            if self.server.port == default_port() {
                self.server.port = port;
            }
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
        }
        if self.places.timeout_seconds == 0 {
            self.places.timeout_seconds = default_upstream_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_upstream_timeout();
        }
        if self.text_generation.base_url.is_empty() {
            self.text_generation.base_url = default_text_base_url();
        }
        if self.text_generation.model.is_empty() {
            self.text_generation.model = default_text_model();
        }
        if self.text_generation.timeout_seconds == 0 {
            self.text_generation.timeout_seconds = default_text_timeout();
        }
        if self.storage.database.is_empty() {
            self.storage.database = default_database();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional, but a provided key must not be blank
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Places", &self.places.api_key),
            ("Weather", &self.weather.api_key),
            ("Text generation", &self.text_generation.api_key),
        ];

        for (service, key) in keys {
            if key.as_ref().is_some_and(|k| k.trim().is_empty()) {
                return Err(PlannerError::config(format!(
                    "{service} API key cannot be empty if provided. Either remove it or provide a valid key."
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Places", self.places.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
            ("Text generation", self.text_generation.timeout_seconds),
        ];

        for (service, timeout) in timeouts {
            if timeout > 300 {
                return Err(PlannerError::config(format!(
                    "{service} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if !(0.0..=2.0).contains(&self.text_generation.temperature) {
            return Err(
                PlannerError::config("Text generation temperature must be between 0 and 2").into(),
            );
        }

        if self.policy.min_description_length > 10_000 {
            return Err(PlannerError::config(
                "Minimum description length cannot exceed 10000 characters",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Places", &self.places.base_url),
            ("Weather", &self.weather.base_url),
            ("Text generation", &self.text_generation.base_url),
        ];
        for (service, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlannerError::config(format!(
                    "{service} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Socket address the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.places.base_url, "https://api.opentripmap.com/0.1/en/places");
        assert_eq!(config.text_generation.model, "gpt2");
        assert_eq!(config.text_generation.timeout_seconds, 30);
        assert_eq!(config.policy.min_description_length, 100);
        assert_eq!(config.logging.level, "info");
        assert!(config.places.api_key.is_none());
        assert!(config.storage.mongodb_uri.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_fallbacks_fill_unset_values() {
        let mut config = PlannerConfig::default();
        config.apply_env_fallbacks(env_of(&[
            ("OPENTRIPMAP_API_KEY", "otm-key"),
            ("WEATHER_API_KEY", "owm-key"),
            ("HUGGINGFACE_API_KEY", ""),
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("MONGODB_DB_NAME", "trips"),
            ("PORT", "8080"),
        ]));

        assert_eq!(config.places.api_key.as_deref(), Some("otm-key"));
        assert_eq!(config.weather.api_key.as_deref(), Some("owm-key"));
        assert!(config.text_generation.api_key.is_none());
        assert_eq!(config.storage.mongodb_uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(config.storage.database, "trips");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_env_fallbacks_do_not_override_explicit_values() {
        let mut config = PlannerConfig::default();
        config.places.api_key = Some("from-file".to_string());
        config.apply_env_fallbacks(env_of(&[("OPENTRIPMAP_API_KEY", "from-env")]));
        assert_eq!(config.places.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_config_validation_blank_api_key() {
        let mut config = PlannerConfig::default();
        config.weather.api_key = Some("   ".to_string());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = PlannerConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = PlannerConfig::default();
        config.text_generation.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_base_url_scheme() {
        let mut config = PlannerConfig::default();
        config.places.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_restores_zeroed_values() {
        let mut config = PlannerConfig::default();
        config.places.timeout_seconds = 0;
        config.text_generation.model = String::new();
        config.apply_defaults();
        assert_eq!(config.places.timeout_seconds, 15);
        assert_eq!(config.text_generation.model, "gpt2");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = PlannerConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("itinerary-planner"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
