//! Configuration types for the Omnilytics core library

use crate::{OmnilyticsError, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Default public analytics host
pub const DEFAULT_SERVICE_URL: &str = "https://usageanalytics.coveo.com";

/// Default REST API version tag
pub const DEFAULT_API_VERSION: &str = "v15";

/// Prefix for environment overrides, e.g. `OMNILYTICS__ANALYTICS__TOKEN`
pub const ENV_PREFIX: &str = "OMNILYTICS";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OmnilyticsConfig {
    /// Analytics service client settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Query suggestion settings
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    /// Visitor cookie persistence
    #[serde(default)]
    pub cookies: CookieConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics service client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Base URL of the analytics service
    #[serde(default = "default_service_url")]
    pub service_url: Url,
    /// REST API version tag
    #[serde(default = "default_api_version")]
    pub version: String,
    /// Access token used for authorization
    #[serde(default)]
    pub token: Option<String>,
    /// Organization identifier sent as `org`
    #[serde(default)]
    pub organization: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Upper bound on how long a queued request may take to settle.
    /// `None` waits indefinitely.
    #[serde(default)]
    pub settle_timeout_seconds: Option<u64>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            version: default_api_version(),
            token: None,
            organization: None,
            timeout_seconds: default_timeout(),
            settle_timeout_seconds: None,
        }
    }
}

impl AnalyticsConfig {
    /// Create a configuration pointing at `service_url`
    pub fn new(service_url: Url) -> Self {
        Self {
            service_url,
            ..Default::default()
        }
    }

    /// Set the access token
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the organization
    pub fn with_organization<S: Into<String>>(mut self, organization: S) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// HTTP request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Queue settle timeout, if any
    pub fn settle_timeout(&self) -> Option<Duration> {
        self.settle_timeout_seconds.map(Duration::from_secs)
    }
}

/// Query suggestion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// Title shown above the suggestion rows
    #[serde(default = "default_header_title")]
    pub header_title: String,
    /// How many suggestions to request and display
    #[serde(default = "default_number_of_suggestions")]
    pub number_of_suggestions: usize,
    /// Stacking order handed back to the host box
    #[serde(default = "default_z_index")]
    pub z_index: i32,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            header_title: default_header_title(),
            number_of_suggestions: default_number_of_suggestions(),
            z_index: default_z_index(),
        }
    }
}

/// Visitor cookie persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieConfig {
    /// File used to persist cookies; in-memory when unset
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json, pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl OmnilyticsConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // Try YAML first, then JSON
        match serde_yaml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(_) => {
                let config = serde_json::from_str(&content)?;
                Ok(config)
            }
        }
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration layering an optional file and `OMNILYTICS__*`
    /// environment variables on top of the defaults
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(OmnilyticsError::not_found(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let scheme = self.analytics.service_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(OmnilyticsError::validation(
                "Service URL must use http or https scheme",
            ));
        }

        if self.analytics.version.trim().is_empty() {
            return Err(OmnilyticsError::validation("API version cannot be empty"));
        }

        if self.analytics.timeout_seconds == 0 {
            return Err(OmnilyticsError::validation(
                "Request timeout must be greater than zero",
            ));
        }

        if self.suggestions.number_of_suggestions == 0 {
            return Err(OmnilyticsError::validation(
                "Number of suggestions must be at least 1",
            ));
        }

        Ok(())
    }
}

// Default value functions
fn default_service_url() -> Url {
    Url::parse(DEFAULT_SERVICE_URL).expect("default service URL is valid")
}
fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_header_title() -> String {
    "Suggested Queries".to_string()
}
fn default_number_of_suggestions() -> usize {
    5
}
fn default_z_index() -> i32 {
    50
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
