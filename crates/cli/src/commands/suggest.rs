//! Suggest command implementation

use async_trait::async_trait;
use clap::Args;
use omnilytics_core::{AnalyticsClient, EventCommon, OmnilyticsError, Result, SearchEvent};
use omnilytics_suggest::{
    OmniboxHost, PopulateRequest, SelectionIntent, SuggestionController, OMNIBOX_ACTION_CAUSE,
    OMNIBOX_ACTION_TYPE,
};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::commands::{CliCommand, CommandContext};
use crate::output::OutputFormatter;

/// Show query suggestions for partial input and optionally pick one
#[derive(Debug, Clone, Args)]
pub struct SuggestCommand {
    /// Text typed so far
    pub partial: String,

    /// Select the suggestion with this exact label
    #[arg(long, conflicts_with = "position")]
    pub select: Option<String>,

    /// Select the suggestion at this zero-based position
    #[arg(long)]
    pub position: Option<usize>,
}

impl SuggestCommand {
    fn intent(&self) -> Option<SelectionIntent> {
        match (&self.select, self.position) {
            (Some(label), _) => Some(SelectionIntent::Label(label.clone())),
            (None, Some(position)) => Some(SelectionIntent::Position(position)),
            (None, None) => None,
        }
    }
}

/// Omnibox host backed by the terminal
///
/// Executing the query logs a search event for the selected text.
pub struct ConsoleHost {
    client: AnalyticsClient,
    query: Mutex<String>,
    formatter: Mutex<OutputFormatter>,
}

impl ConsoleHost {
    pub fn new(client: AnalyticsClient, formatter: OutputFormatter) -> Self {
        Self {
            client,
            query: Mutex::new(String::new()),
            formatter: Mutex::new(formatter),
        }
    }

    pub fn query(&self) -> String {
        self.query.lock().clone()
    }

    fn say(&self, message: &str) -> Result<()> {
        let mut formatter = self.formatter.lock();
        if formatter.is_human() {
            formatter.info(message)?;
        }
        Ok(())
    }
}

#[async_trait]
impl OmniboxHost for ConsoleHost {
    async fn clear(&self) -> Result<()> {
        tracing::debug!("Clearing suggestions");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("Closing suggestions");
        Ok(())
    }

    async fn set_query_text(&self, text: &str) -> Result<()> {
        *self.query.lock() = text.to_string();
        self.say(&format!("Query set to '{}'", text))
    }

    async fn execute_query(&self) -> Result<()> {
        let event = SearchEvent {
            common: EventCommon::new(OMNIBOX_ACTION_CAUSE, OMNIBOX_ACTION_TYPE),
            search_query_uid: Uuid::new_v4().to_string(),
            query_text: self.query(),
            ..SearchEvent::default()
        };
        self.client.send_search_events(&[event]).await?;
        self.say(&format!("Executed query '{}'", self.query()))
    }
}

impl CliCommand for SuggestCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let client = ctx.connect()?;
        let host = ConsoleHost::new(client.clone(), ctx.formatter());
        let controller = SuggestionController::new(client, host, ctx.config.suggestions.clone());

        let request = PopulateRequest::new(self.partial.as_str());
        let result = controller.handle_populate_request(&request).await;

        let mut formatter = ctx.formatter();
        if result.element.is_none() && formatter.is_human() {
            formatter.warning("No suggestions available")?;
        } else {
            formatter.output(&result)?;
        }

        let Some(intent) = self.intent() else {
            return Ok(());
        };

        if controller.select_suggestion(intent.clone()).await? {
            controller.on_query_success();
            Ok(())
        } else {
            Err(OmnilyticsError::not_found(format!(
                "No displayed suggestion matches {:?}",
                intent
            )))
        }
    }

    fn name(&self) -> &'static str {
        "suggest"
    }
}
