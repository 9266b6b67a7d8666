//! CLI configuration module

use omnilytics_core::{OmnilyticsConfig, OmnilyticsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default configuration file written by `init`
pub const DEFAULT_CONFIG_FILE: &str = "omnilytics.yaml";

/// CLI-specific configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub output_format: OutputFormat,
    /// Whether to use colors in output
    pub use_colors: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Pretty,
            use_colors: true,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
    Pretty,
    Compact,
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Table => "table",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = OmnilyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "table" => Ok(Self::Table),
            _ => Err(OmnilyticsError::validation(format!(
                "Invalid output format: {}",
                s
            ))),
        }
    }
}

/// Command line values that override the loaded configuration
#[derive(Debug, Default, Clone)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub output_format: Option<String>,
    pub use_colors: Option<bool>,
    pub service_url: Option<String>,
    pub token: Option<String>,
    pub organization: Option<String>,
    pub cookie_file: Option<PathBuf>,
}

/// Resolves the analytics configuration and CLI options for a run
#[derive(Debug, Default)]
pub struct ConfigManager {
    cli_config: CliConfig,
    config: OmnilyticsConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the analytics configuration from `path`, the environment and
    /// defaults
    pub fn load(&mut self, path: Option<&Path>) -> Result<()> {
        self.config = OmnilyticsConfig::load(path)?;
        Ok(())
    }

    /// Apply command line overrides
    pub fn merge_with_args(&mut self, args: &CliArgs) -> Result<()> {
        if let Some(output_format) = &args.output_format {
            self.cli_config.output_format = output_format.parse()?;
        }

        if let Some(use_colors) = args.use_colors {
            self.cli_config.use_colors = use_colors;
        }

        if let Some(service_url) = &args.service_url {
            self.config.analytics.service_url = Url::parse(service_url)?;
        }

        if let Some(token) = &args.token {
            self.config.analytics.token = Some(token.clone());
        }

        if let Some(organization) = &args.organization {
            self.config.analytics.organization = Some(organization.clone());
        }

        if let Some(cookie_file) = &args.cookie_file {
            self.config.cookies.path = Some(cookie_file.clone());
        }

        Ok(())
    }

    pub fn cli_config(&self) -> &CliConfig {
        &self.cli_config
    }

    pub fn config(&self) -> &OmnilyticsConfig {
        &self.config
    }

    /// Consume the manager, returning both configurations
    pub fn into_parts(self) -> (OmnilyticsConfig, CliConfig) {
        (self.config, self.cli_config)
    }
}

/// Default location of the persistent cookie jar
pub fn default_cookie_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("omnilytics").join("cookies.json"),
        None => PathBuf::from(".omnilytics").join("cookies.json"),
    }
}

/// Check if output supports colors
pub fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    atty::is(atty::Stream::Stdout)
}
