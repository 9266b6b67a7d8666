//! Document view command implementation

use clap::Args;
use omnilytics_core::{ClickEvent, EventCommon, OmnilyticsError, ReqwestTransport, Result};
use std::sync::Arc;

use crate::commands::{CliCommand, CommandContext};

/// Log a document view (click on a search result)
#[derive(Debug, Clone, Args)]
pub struct ClickCommand {
    /// Unique document URI
    #[arg(long)]
    pub uri: String,

    /// Hash of the document URI (defaults to the URI)
    #[arg(long)]
    pub uri_hash: Option<String>,

    /// Clickable document URL (defaults to the URI)
    #[arg(long)]
    pub url: Option<String>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// One-based position of the document in the result list
    #[arg(long, default_value_t = 1)]
    pub position: u32,

    /// Source the document was indexed from
    #[arg(long)]
    pub source: String,

    /// Id of the search that produced the result
    #[arg(long)]
    pub search_uid: String,

    /// Action cause
    #[arg(long, default_value = "documentOpen")]
    pub cause: String,

    /// Action type
    #[arg(long = "type", default_value = "document")]
    pub action_type: String,
}

impl ClickCommand {
    pub fn build_event(&self) -> ClickEvent {
        ClickEvent {
            common: EventCommon::new(self.cause.as_str(), self.action_type.as_str()),
            search_query_uid: self.search_uid.clone(),
            document_uri: self.uri.clone(),
            document_uri_hash: self.uri_hash.clone().unwrap_or_else(|| self.uri.clone()),
            document_url: self.url.clone().unwrap_or_else(|| self.uri.clone()),
            document_title: self.title.clone(),
            document_position: self.position,
            source_name: self.source.clone(),
            collection_name: None,
        }
    }
}

impl CliCommand for ClickCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let event = self.build_event();

        // Keep a handle on the transport to flush the beacon before exiting
        let transport = ReqwestTransport::new(ctx.config.analytics.timeout())?;
        let client =
            omnilytics_infra::connect_with_transport(&ctx.config, Arc::new(transport.clone()))?;

        let response = client.send_document_view_event(&event).await?;
        transport.wait_for_beacons().await;

        let mut formatter = ctx.formatter();
        match response {
            Some(response) => formatter.output(&response),
            None => formatter.success(&format!("Document view for {} sent", self.uri)),
        }
    }

    fn name(&self) -> &'static str {
        "click"
    }

    fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(OmnilyticsError::validation("Document URI cannot be empty"));
        }
        if self.search_uid.trim().is_empty() {
            return Err(OmnilyticsError::validation("Search id cannot be empty"));
        }
        if self.position == 0 {
            return Err(OmnilyticsError::validation("Positions start at 1"));
        }
        Ok(())
    }
}
