//! Validate command implementation

use clap::Args;
use omnilytics_core::{OmnilyticsConfig, OmnilyticsError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::commands::{CliCommand, CommandContext};

/// Validate an Omnilytics configuration
#[derive(Debug, Clone, Args)]
pub struct ValidateCommand {
    /// Configuration file to validate (defaults to the loaded configuration)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Also check that the analytics service answers
    #[arg(long)]
    pub check_service: bool,

    /// Only show errors (suppress warnings)
    #[arg(long)]
    pub errors_only: bool,
}

/// Findings grouped by category
#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn add_error(&mut self, category: &str, message: impl Into<String>) {
        self.errors
            .entry(category.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_warning(&mut self, category: &str, message: impl Into<String>) {
        self.warnings
            .entry(category.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl ValidateCommand {
    /// Static checks on a configuration
    pub fn check_config(&self, config: &OmnilyticsConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        if let Err(e) = config.validate() {
            result.add_error("config", e.to_string());
        }

        if !self.errors_only {
            let analytics = &config.analytics;
            if analytics.token.is_none() {
                result.add_warning("analytics", "No access token; the service may reject calls");
            }
            if analytics.organization.is_none() {
                result.add_warning("analytics", "No organization configured");
            }
            if config.cookies.path.is_none() {
                result.add_warning(
                    "cookies",
                    "No cookie file; the visitor id is lost when the process exits",
                );
            }
        }

        result
    }

    fn load(&self, ctx: &CommandContext) -> Result<OmnilyticsConfig> {
        match &self.file {
            Some(path) => {
                if !path.exists() {
                    return Err(OmnilyticsError::not_found(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                OmnilyticsConfig::from_file(path)
            }
            None => Ok(ctx.config.clone()),
        }
    }
}

impl CliCommand for ValidateCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let config = self.load(ctx)?;
        let mut result = self.check_config(&config);

        if self.check_service && !result.has_errors() {
            let ctx = CommandContext::new(config, ctx.cli.clone());
            match ctx.connect()?.visit_id().await {
                Ok(visit_id) => tracing::info!("Service reachable, visit {}", visit_id),
                Err(e) => result.add_error("service", e.to_string()),
            }
        }

        result.valid = !result.has_errors();

        let mut formatter = ctx.formatter();
        if formatter.is_human() {
            for (category, errors) in &result.errors {
                for error in errors {
                    formatter.error(&format!("[{}] {}", category, error))?;
                }
            }
            for (category, warnings) in &result.warnings {
                for warning in warnings {
                    formatter.warning(&format!("[{}] {}", category, warning))?;
                }
            }
            if result.valid {
                formatter.success("Configuration is valid")?;
            }
        } else {
            formatter.output(&result)?;
        }

        if result.valid {
            Ok(())
        } else {
            Err(OmnilyticsError::validation("Configuration is invalid"))
        }
    }

    fn name(&self) -> &'static str {
        "validate"
    }
}
