//! CLI commands module

use crate::config::CliConfig;
use crate::output::OutputFormatter;
use omnilytics_core::{AnalyticsClient, OmnilyticsConfig, OmnilyticsError, Result};
use omnilytics_infra::TimedSpan;
use serde_json::Value;

pub mod click;
pub mod custom;
pub mod init;
pub mod search;
pub mod suggest;
pub mod top_queries;
pub mod validate;
pub mod visit;

pub use click::*;
pub use custom::*;
pub use init::*;
pub use search::*;
pub use suggest::*;
pub use top_queries::*;
pub use validate::*;
pub use visit::*;

/// Everything a command needs from the surrounding run
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub config: OmnilyticsConfig,
    pub cli: CliConfig,
}

impl CommandContext {
    pub fn new(config: OmnilyticsConfig, cli: CliConfig) -> Self {
        Self { config, cli }
    }

    /// Formatter writing to stdout
    pub fn formatter(&self) -> OutputFormatter {
        OutputFormatter::new(&self.cli)
    }

    /// Analytics client on a fresh session
    pub fn connect(&self) -> Result<AnalyticsClient> {
        omnilytics_infra::connect(&self.config)
    }
}

/// Base trait for CLI commands
#[allow(async_fn_in_trait)]
pub trait CliCommand {
    /// Execute the command
    async fn execute(&self, ctx: &CommandContext) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;

    /// Validate command arguments
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Common command execution wrapper
pub async fn execute_command<T: CliCommand>(command: &T, ctx: &CommandContext) -> Result<()> {
    let _timer = TimedSpan::new(command.name());
    tracing::debug!("Executing command: {}", command.name());

    let outcome = match command.validate() {
        Ok(()) => command.execute(ctx).await,
        Err(e) => Err(e),
    };
    if let Err(e) = outcome {
        tracing::error!(
            category = %e.category(),
            "Command {} failed: {}",
            command.name(),
            e
        );
        return Err(e);
    }

    tracing::debug!("Command {} completed successfully", command.name());
    Ok(())
}

/// Parse a `key=value` argument
pub fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}

/// Custom dimension value from a command line string
///
/// Numbers, booleans and `null` keep their JSON type; anything else is sent
/// as a string. Arrays and objects are rejected since the service only stores
/// scalar dimensions.
pub fn custom_data_value(raw: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(_)) | Ok(Value::Object(_)) => Err(OmnilyticsError::validation(format!(
            "Custom data must be scalar, got '{}'",
            raw
        ))),
        Ok(value) => Ok(value),
        Err(_) => Ok(Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCommand {
        valid: bool,
    }

    impl CliCommand for TestCommand {
        async fn execute(&self, _ctx: &CommandContext) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "test"
        }

        fn validate(&self) -> Result<()> {
            if self.valid {
                Ok(())
            } else {
                Err(OmnilyticsError::validation("invalid"))
            }
        }
    }

    #[tokio::test]
    async fn test_execute_command() {
        let ctx = CommandContext::default();
        assert!(execute_command(&TestCommand { valid: true }, &ctx).await.is_ok());
        assert!(execute_command(&TestCommand { valid: false }, &ctx)
            .await
            .is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("hub=main").unwrap(),
            ("hub".to_string(), "main".to_string())
        );
        assert_eq!(
            parse_key_value("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_custom_data_value() {
        assert_eq!(custom_data_value("3").unwrap(), Value::from(3));
        assert_eq!(custom_data_value("true").unwrap(), Value::Bool(true));
        assert_eq!(
            custom_data_value("hello world").unwrap(),
            Value::String("hello world".to_string())
        );
        assert!(custom_data_value("[1,2]").is_err());
        assert!(custom_data_value("{\"a\":1}").is_err());
    }
}
