//! Logging setup for Omnilytics binaries
//!
//! Builds a `tracing` subscriber from [`LoggerConfig`], which can come from
//! the `logging` section of the configuration file or from `OMNILYTICS_LOG_*`
//! environment variables.

use omnilytics_core::config::LoggingConfig;
use omnilytics_core::{OmnilyticsError, Result};
use std::str::FromStr;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Noisy dependencies capped at `warn`
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "reqwest=warn", "h2=warn"];

/// Output style of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = OmnilyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(OmnilyticsError::validation(format!(
                "Invalid log format '{}', expected pretty, compact or json",
                other
            ))),
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
    pub with_timestamps: bool,
    /// Include file and line of the call site
    pub with_file_info: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_timestamps: true,
            with_file_info: false,
        }
    }
}

impl LoggerConfig {
    /// Logger configuration from the `logging` configuration section
    pub fn from_logging_config(config: &LoggingConfig) -> Result<Self> {
        Ok(Self {
            level: config.level.clone(),
            format: config.format.parse()?,
            ..Self::default()
        })
    }

    /// Override the level, e.g. from a `--verbose` flag
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }
}

/// Install the global subscriber
pub fn init_logger(config: LoggerConfig) -> Result<()> {
    let level = LogLevel::parse(&config.level)?;

    let mut env_filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in QUIET_TARGETS {
        let directive = directive
            .parse()
            .map_err(|e| OmnilyticsError::validation(format!("Invalid log directive: {}", e)))?;
        env_filter = env_filter.add_directive(directive);
    }

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(config.with_file_info)
            .with_line_number(config.with_file_info)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            if config.with_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(config.with_file_info)
                .with_line_number(config.with_file_info)
                .with_writer(std::io::stderr);
            if config.with_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| OmnilyticsError::invalid_state(format!("Failed to initialize logger: {}", e)))?;

    tracing::debug!("Logger initialized with level: {}", config.level);
    Ok(())
}

/// Quiet logger for tests, safe to call repeatedly
pub fn init_test_logger() {
    let config = LoggerConfig {
        level: "warn".to_string(),
        with_timestamps: false,
        ..LoggerConfig::default()
    };
    let _ = init_logger(config);
}

/// Logger configuration from `OMNILYTICS_LOG_*` environment variables
pub fn logger_config_from_env() -> LoggerConfig {
    let defaults = LoggerConfig::default();
    LoggerConfig {
        level: std::env::var("OMNILYTICS_LOG_LEVEL").unwrap_or(defaults.level),
        format: std::env::var("OMNILYTICS_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.format),
        with_timestamps: std::env::var("OMNILYTICS_LOG_TIMESTAMPS")
            .map(|v| v.parse().unwrap_or(true))
            .unwrap_or(defaults.with_timestamps),
        with_file_info: std::env::var("OMNILYTICS_LOG_FILE_INFO")
            .map(|v| v.parse().unwrap_or(false))
            .unwrap_or(defaults.with_file_info),
    }
}

/// Log level utilities
pub struct LogLevel;

impl LogLevel {
    pub fn parse(level: &str) -> Result<Level> {
        Level::from_str(level).map_err(|e| {
            OmnilyticsError::validation(format!("Invalid log level '{}': {}", level, e))
        })
    }

    pub fn all_levels() -> &'static [&'static str] {
        &["trace", "debug", "info", "warn", "error"]
    }

    pub fn is_valid(level: &str) -> bool {
        Self::all_levels().contains(&level.to_lowercase().as_str())
    }
}

/// Logs how long an operation took when dropped
pub struct TimedSpan {
    span: tracing::Span,
    start: Instant,
    name: String,
}

impl TimedSpan {
    pub fn new(name: &str) -> Self {
        Self {
            span: tracing::info_span!("operation", name = name),
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.span.in_scope(f)
    }
}

impl Drop for TimedSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.span.in_scope(|| {
            tracing::debug!(
                "Operation '{}' completed in {}ms",
                self.name,
                elapsed.as_millis()
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.with_timestamps);
        assert!(!config.with_file_info);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_logging_config() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let config = LoggerConfig::from_logging_config(&logging).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);

        let config = config.with_level("trace");
        assert_eq!(config.level, "trace");
    }

    #[test]
    fn test_log_level_parse() {
        assert!(LogLevel::parse("info").is_ok());
        assert!(LogLevel::parse("debug").is_ok());
        assert!(LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_log_level_validation() {
        assert!(LogLevel::is_valid("info"));
        assert!(LogLevel::is_valid("ERROR"));
        assert!(!LogLevel::is_valid("loud"));
        assert_eq!(LogLevel::all_levels().len(), 5);
    }

    #[test]
    fn test_logger_config_from_env() {
        std::env::set_var("OMNILYTICS_LOG_LEVEL", "debug");
        std::env::set_var("OMNILYTICS_LOG_FORMAT", "json");

        let config = logger_config_from_env();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);

        std::env::remove_var("OMNILYTICS_LOG_LEVEL");
        std::env::remove_var("OMNILYTICS_LOG_FORMAT");
    }

    #[tokio::test]
    async fn test_init_test_logger_twice() {
        init_test_logger();
        init_test_logger();
    }

    #[test]
    fn test_timed_span_in_scope() {
        let span = TimedSpan::new("scoped_operation");
        let result = span.in_scope(|| 42);
        assert_eq!(result, 42);
    }
}
