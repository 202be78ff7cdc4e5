use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the OpenWeatherMap API key
pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
/// Environment variable holding the history database location
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable holding the listen port
pub const ENV_PORT: &str = "PORT";
/// Environment variable pointing at an explicit config file
pub const ENV_CONFIG_PATH: &str = "AGRIWX_CONFIG";

/// Default number of lookups kept in the history store
pub const DEFAULT_MAX_RETAINED: usize = 5;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a summary of all errors joined into one line
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream weather provider settings
    #[serde(default)]
    pub openweather: OpenWeatherConfig,

    /// Lookup history retention
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    /// API key; lookups fail as misconfigured without it
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the current weather and forecast endpoints
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for the direct geocoding endpoint
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    /// Per-request timeout for upstream calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_geo_base_url() -> String {
    "http://api.openweathermap.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl OpenWeatherConfig {
    /// The API key, if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for OpenWeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("geo_base_url", &self.geo_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            geo_base_url: default_geo_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// SQLite database location (plain path or `sqlite://` URL).
    /// Retention is disabled when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum number of lookups kept
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,
}

fn default_max_retained() -> usize {
    DEFAULT_MAX_RETAINED
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_retained: default_max_retained(),
        }
    }
}

impl HistoryConfig {
    /// Filesystem path of the database, with any `sqlite://` scheme stripped
    pub fn database_path(&self) -> Option<PathBuf> {
        let raw = self.database_url.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let path = raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
            .unwrap_or(raw);
        Some(PathBuf::from(path))
    }

    pub fn is_enabled(&self) -> bool {
        self.database_path().is_some()
    }
}

impl Config {
    /// Load configuration: defaults, then the optional config file, then the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    ///
    /// A file named by `AGRIWX_CONFIG` must exist; the default location is
    /// optional.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_CONFIG_PATH) {
            Some(explicit) => {
                let path = PathBuf::from(explicit);
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(lookup);
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load()?;
        let validation = config.checked()?;
        Ok((config, validation))
    }

    /// Validate, turning errors into [`ConfigError::Invalid`] and logging warnings.
    pub fn checked(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Invalid(format!("{}: {}", path.display(), e)),
        })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Overlay values from an environment-style lookup.
    ///
    /// Unparseable `PORT` values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.openweather.api_key = Some(key);
        }

        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.history.database_url = Some(url);
        }

        if let Some(port) = lookup(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(e) => tracing::warn!("Ignoring invalid {}={:?}: {}", ENV_PORT, port, e),
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.openweather.api_base_url,
            "openweather.api_base_url",
            &mut result,
        );
        self.validate_url(
            &self.openweather.geo_base_url,
            "openweather.geo_base_url",
            &mut result,
        );

        if self.openweather.request_timeout_secs == 0 {
            result.add_error(
                "openweather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.openweather.api_key().is_none() {
            result.add_warning(
                "openweather.api_key",
                format!("{} not set - every lookup will fail", ENV_API_KEY),
            );
        }

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        if self.history.max_retained == 0 {
            result.add_error(
                "history.max_retained",
                "At least one lookup must be retained",
            );
        }

        if !self.history.is_enabled() {
            result.add_warning(
                "history.database_url",
                "No database configured - lookup history is disabled",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// `<config_dir>/agriwx/config.toml`
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agriwx").join("config.toml"))
    }
}
