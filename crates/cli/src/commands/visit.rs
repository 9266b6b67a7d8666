//! Visit command implementation

use clap::Args;
use omnilytics_core::Result;
use serde::Serialize;

use crate::commands::{CliCommand, CommandContext};

/// Show the current visit and visitor identifiers
#[derive(Debug, Clone, Args)]
pub struct VisitCommand {
    /// Only report cached values, without contacting the service
    #[arg(long)]
    pub cached: bool,
}

/// Session identifiers as printed by `visit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReport {
    pub visit_id: Option<String>,
    pub visitor_id: Option<String>,
}

impl CliCommand for VisitCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let client = ctx.connect()?;

        let visit_id = if self.cached {
            client.current_visit_id()
        } else {
            Some(client.visit_id().await?)
        };

        let report = VisitReport {
            visit_id,
            visitor_id: client.session().visitor_id(),
        };
        ctx.formatter().output(&report)
    }

    fn name(&self) -> &'static str {
        "visit"
    }
}
