//! Suggestion widget state machine
//!
//! [`SuggestionWidget`] holds no I/O. It turns fetched suggestions into a
//! render model, remembers what is on screen and what the user typed, and
//! turns a selection into an ordered list of [`SelectionStep`]s. The
//! controller feeds it network results and applies the steps to the host.

use crate::handler::{DefaultSelectionHandler, SelectionContext, SelectionHandler};
use crate::model::{
    DisplayedSuggestion, PopulateRequest, PopulateResult, RenderModel, SelectionIntent,
    SelectionStep, SuggestionRow,
};
use indexmap::IndexMap;
use omnilytics_core::{SuggestionsConfig, TopQueriesParams};
use std::sync::Arc;
use tracing::debug;

/// Pure state of the query suggestion dropdown
#[derive(Debug)]
pub struct SuggestionWidget {
    config: SuggestionsConfig,
    handler: Arc<dyn SelectionHandler>,
    partial_queries: Vec<String>,
    last_suggestions: Vec<String>,
    results_to_build_with: Option<RenderModel>,
    currently_displayed: IndexMap<String, DisplayedSuggestion>,
    last_request: Option<PopulateRequest>,
}

impl SuggestionWidget {
    /// Widget using the default selection handler
    pub fn new(config: SuggestionsConfig) -> Self {
        Self::with_handler(config, Arc::new(DefaultSelectionHandler))
    }

    /// Widget using a custom selection handler
    pub fn with_handler(config: SuggestionsConfig, handler: Arc<dyn SelectionHandler>) -> Self {
        Self {
            config,
            handler,
            partial_queries: Vec::new(),
            last_suggestions: Vec::new(),
            results_to_build_with: None,
            currently_displayed: IndexMap::new(),
            last_request: None,
        }
    }

    pub fn config(&self) -> &SuggestionsConfig {
        &self.config
    }

    /// Partial query history since the last successful query
    pub fn partial_queries(&self) -> &[String] {
        &self.partial_queries
    }

    pub fn last_suggestions(&self) -> &[String] {
        &self.last_suggestions
    }

    /// Model of what is currently rendered
    pub fn render_model(&self) -> Option<&RenderModel> {
        self.results_to_build_with.as_ref()
    }

    pub fn displayed(&self) -> &IndexMap<String, DisplayedSuggestion> {
        &self.currently_displayed
    }

    pub fn last_request(&self) -> Option<&PopulateRequest> {
        self.last_request.as_ref()
    }

    /// Top-queries parameters for a populate request
    pub fn top_queries_params(&self, request: &PopulateRequest) -> TopQueriesParams {
        TopQueriesParams::new(self.config.number_of_suggestions, &request.partial_query)
    }

    /// Record fetched suggestions and build what the host should draw
    pub fn apply_suggestions(
        &mut self,
        request: &PopulateRequest,
        mut suggestions: Vec<String>,
    ) -> PopulateResult {
        suggestions.truncate(self.config.number_of_suggestions);

        if !suggestions.is_empty() && !request.partial_query.is_empty() {
            self.partial_queries.push(request.partial_query.clone());
        }

        let rows: Vec<SuggestionRow> = suggestions
            .iter()
            .enumerate()
            .map(|(position, label)| SuggestionRow::new(label.as_str(), position))
            .collect();

        self.currently_displayed = rows
            .iter()
            .map(|row| {
                (
                    row.label.clone(),
                    DisplayedSuggestion {
                        row_id: row.id.clone(),
                        position: row.position,
                    },
                )
            })
            .collect();

        let model = RenderModel {
            header_title: self.config.header_title.clone(),
            rows,
        };
        debug!(
            "Rendering {} suggestions for '{}'",
            model.rows.len(),
            request.partial_query
        );

        self.last_suggestions = suggestions;
        self.results_to_build_with = Some(model.clone());
        self.last_request = Some(request.clone());

        PopulateResult {
            element: Some(model),
            z_index: self.config.z_index,
        }
    }

    /// Forget the rendered rows after a failed fetch
    pub fn apply_failure(&mut self, request: &PopulateRequest) -> PopulateResult {
        self.results_to_build_with = None;
        self.currently_displayed.clear();
        self.last_request = Some(request.clone());

        PopulateResult {
            element: None,
            z_index: self.config.z_index,
        }
    }

    /// Label of the displayed row matching `intent`
    pub fn resolve(&self, intent: &SelectionIntent) -> Option<&str> {
        match intent {
            SelectionIntent::Label(label) => self
                .currently_displayed
                .get_key_value(label.as_str())
                .map(|(label, _)| label.as_str()),
            SelectionIntent::Position(position) => self
                .currently_displayed
                .iter()
                .find(|(_, displayed)| displayed.position == *position)
                .map(|(label, _)| label.as_str()),
        }
    }

    /// Steps for choosing `value` in answer to `request`
    pub fn select(&self, value: &str, request: &PopulateRequest) -> Vec<SelectionStep> {
        let context = SelectionContext {
            value,
            request,
            partial_queries: &self.partial_queries,
            last_suggestions: &self.last_suggestions,
        };
        self.handler.on_select(&context)
    }

    /// Steps for selecting a displayed row, `None` when nothing matches
    pub fn select_intent(&self, intent: &SelectionIntent) -> Option<Vec<SelectionStep>> {
        let value = self.resolve(intent)?;
        let request = self.last_request.clone().unwrap_or_default();
        Some(self.select(value, &request))
    }

    /// A query ran, so the typing history starts over
    pub fn on_query_success(&mut self) {
        self.partial_queries.clear();
    }
}
