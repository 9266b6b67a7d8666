//! Custom event command implementation

use clap::Args;
use omnilytics_core::{CustomEvent, OmnilyticsError, Result};

use crate::commands::{custom_data_value, parse_key_value, CliCommand, CommandContext};

/// Log a custom analytics event
#[derive(Debug, Clone, Args)]
pub struct CustomCommand {
    /// Action cause, e.g. omniboxAnalytics
    #[arg(long)]
    pub cause: String,

    /// Action type, e.g. omnibox
    #[arg(long = "type")]
    pub action_type: String,

    /// Custom dimension, repeatable
    #[arg(short, long = "data", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub data: Vec<(String, String)>,

    /// Interface language
    #[arg(long)]
    pub language: Option<String>,

    /// Search hub the event originates from
    #[arg(long)]
    pub origin: Option<String>,

    /// Last query the user performed
    #[arg(long)]
    pub last_search_uid: Option<String>,
}

impl CustomCommand {
    /// Event described by the arguments
    pub fn build_event(&self) -> Result<CustomEvent> {
        let mut event = CustomEvent::new(self.cause.as_str(), self.action_type.as_str());
        for (key, raw) in &self.data {
            event = event.with_custom_data(key.as_str(), custom_data_value(raw)?);
        }
        if let Some(language) = &self.language {
            event = event.with_language(language.as_str());
        }
        if let Some(origin) = &self.origin {
            event = event.with_origin(origin.as_str());
        }
        event.last_search_query_uid = self.last_search_uid.clone();
        Ok(event)
    }
}

impl CliCommand for CustomCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let event = self.build_event()?;
        let client = ctx.connect()?;

        let response = client.send_custom_event(&event).await?;

        let mut formatter = ctx.formatter();
        if formatter.is_human() {
            formatter.success(&format!("Logged {} event", self.cause))?;
        }
        formatter.output(&response)
    }

    fn name(&self) -> &'static str {
        "custom"
    }

    fn validate(&self) -> Result<()> {
        if self.cause.trim().is_empty() || self.action_type.trim().is_empty() {
            return Err(OmnilyticsError::validation(
                "Both --cause and --type are required",
            ));
        }
        for (_, raw) in &self.data {
            custom_data_value(raw)?;
        }
        Ok(())
    }
}
