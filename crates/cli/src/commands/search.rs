//! Search event command implementation

use clap::Args;
use omnilytics_core::{EventCommon, Result, SearchEvent};
use uuid::Uuid;

use crate::commands::{CliCommand, CommandContext};

/// Log one search event per query, sent as a single batch
#[derive(Debug, Clone, Args)]
pub struct SearchCommand {
    /// Query text, repeatable
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// Action cause
    #[arg(long, default_value = "searchboxSubmit")]
    pub cause: String,

    /// Action type
    #[arg(long = "type", default_value = "search box")]
    pub action_type: String,

    /// Number of results the query returned
    #[arg(long, default_value_t = 0)]
    pub results: u64,

    /// Query duration in milliseconds
    #[arg(long, default_value_t = 0)]
    pub response_time: u64,

    /// Interface language
    #[arg(long)]
    pub language: Option<String>,

    /// Search hub
    #[arg(long)]
    pub origin: Option<String>,
}

impl SearchCommand {
    /// One event per query, each with a fresh query id
    pub fn build_events(&self) -> Vec<SearchEvent> {
        self.queries
            .iter()
            .map(|query| {
                let mut common = EventCommon::new(self.cause.as_str(), self.action_type.as_str());
                common.language = self.language.clone();
                common.origin_level1 = self.origin.clone();

                SearchEvent {
                    common,
                    search_query_uid: Uuid::new_v4().to_string(),
                    query_text: query.clone(),
                    number_of_results: self.results,
                    response_time: self.response_time,
                    ..SearchEvent::default()
                }
            })
            .collect()
    }
}

impl CliCommand for SearchCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let events = self.build_events();
        let client = ctx.connect()?;

        let mut formatter = ctx.formatter();
        match client.send_search_events(&events).await? {
            Some(response) => {
                if formatter.is_human() {
                    formatter.success(&format!("Logged {} search events", events.len()))?;
                }
                formatter.output(&response)
            }
            None => formatter.info("No search events to send"),
        }
    }

    fn name(&self) -> &'static str {
        "search"
    }
}
