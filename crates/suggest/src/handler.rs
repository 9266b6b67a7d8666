//! Selection handlers
//!
//! A [`SelectionHandler`] decides what happens when a suggestion is chosen.
//! The default handler replaces the query text, logs an omnibox analytics
//! event describing how the user got there, then runs the query.

use crate::clean::clean_custom_data;
use crate::model::{PopulateRequest, SelectionStep};
use omnilytics_core::CustomEvent;
use serde_json::Value;
use std::fmt::Debug;

/// Action cause of the event logged on selection
pub const OMNIBOX_ACTION_CAUSE: &str = "omniboxAnalytics";

/// Action type of the event logged on selection
pub const OMNIBOX_ACTION_TYPE: &str = "omnibox";

/// What the widget knew when a suggestion was chosen
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub value: &'a str,
    pub request: &'a PopulateRequest,
    pub partial_queries: &'a [String],
    pub last_suggestions: &'a [String],
}

impl SelectionContext<'_> {
    /// Zero-based index of the value in the last fetched list, -1 when absent
    pub fn suggestion_ranking(&self) -> i64 {
        self.last_suggestions
            .iter()
            .position(|suggestion| suggestion == self.value)
            .map_or(-1, |index| index as i64)
    }
}

/// Turns a selection into host steps
pub trait SelectionHandler: Send + Sync + Debug {
    fn on_select(&self, context: &SelectionContext<'_>) -> Vec<SelectionStep>;
}

/// Clear, close, set the query, log the omnibox event, execute
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSelectionHandler;

impl DefaultSelectionHandler {
    /// Omnibox analytics event for a selection
    pub fn build_event(context: &SelectionContext<'_>) -> CustomEvent {
        CustomEvent::new(OMNIBOX_ACTION_CAUSE, OMNIBOX_ACTION_TYPE)
            .with_custom_data(
                "partialQueries",
                clean_custom_data(context.partial_queries),
            )
            .with_custom_data("suggestionRanking", Value::from(context.suggestion_ranking()))
            .with_custom_data("suggestions", clean_custom_data(context.last_suggestions))
            .with_custom_data("partialQuery", context.request.partial_query.clone())
    }
}

impl SelectionHandler for DefaultSelectionHandler {
    fn on_select(&self, context: &SelectionContext<'_>) -> Vec<SelectionStep> {
        vec![
            SelectionStep::Clear,
            SelectionStep::Close,
            SelectionStep::SetQueryText(context.value.to_string()),
            SelectionStep::LogEvent(Self::build_event(context)),
            SelectionStep::ExecuteQuery,
        ]
    }
}
