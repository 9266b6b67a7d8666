//! Top queries command implementation

use clap::Args;
use omnilytics_core::{OmnilyticsError, Result, TopQueriesParams};

use crate::commands::{parse_key_value, CliCommand, CommandContext};

/// List the most popular queries matching a prefix
#[derive(Debug, Clone, Args)]
pub struct TopQueriesCommand {
    /// Partial query text
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Number of queries to return (defaults to the configured suggestion count)
    #[arg(short = 'n', long)]
    pub page_size: Option<usize>,

    /// Extra request parameter, repeatable
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

impl TopQueriesCommand {
    fn to_params(&self, default_page_size: usize) -> TopQueriesParams {
        let page_size = self.page_size.unwrap_or(default_page_size);
        self.params.iter().fold(
            TopQueriesParams::new(page_size, self.query.as_str()),
            |params, (key, value)| params.with_param(key.as_str(), value.as_str()),
        )
    }
}

impl CliCommand for TopQueriesCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let client = ctx.connect()?;
        let params = self.to_params(ctx.config.suggestions.number_of_suggestions);

        let queries = client.top_queries(&params).await?;
        tracing::info!("Found {} top queries", queries.len());

        let mut formatter = ctx.formatter();
        if queries.is_empty() && formatter.is_human() {
            return formatter.info("No matching queries");
        }
        formatter.output(&queries)
    }

    fn name(&self) -> &'static str {
        "top-queries"
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == Some(0) {
            return Err(OmnilyticsError::validation("Page size must be at least 1"));
        }
        Ok(())
    }
}
