//! Suggestion controller
//!
//! Thin async adapter between a host search box, the analytics service and
//! the pure [`SuggestionWidget`]. It fetches top queries, hands the result to
//! the widget and applies the widget's selection steps to the host.

use crate::model::{PopulateRequest, PopulateResult, SelectionIntent, SelectionStep};
use crate::widget::SuggestionWidget;
use async_trait::async_trait;
use omnilytics_core::{AnalyticsClient, CustomEvent, Result, SuggestionsConfig, TopQueriesParams};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

/// Where suggestions come from and where selection events go
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Ranked popular queries for the parameters
    async fn top_queries(&self, params: &TopQueriesParams) -> Result<Vec<String>>;

    /// Record an analytics event
    async fn log_custom_event(&self, event: &CustomEvent) -> Result<()>;
}

#[async_trait]
impl SuggestionSource for AnalyticsClient {
    async fn top_queries(&self, params: &TopQueriesParams) -> Result<Vec<String>> {
        AnalyticsClient::top_queries(self, params).await
    }

    async fn log_custom_event(&self, event: &CustomEvent) -> Result<()> {
        self.send_custom_event(event).await.map(|_| ())
    }
}

/// The search box suggestions are rendered into
#[async_trait]
pub trait OmniboxHost: Send + Sync {
    /// Empty the box's dropdown
    async fn clear(&self) -> Result<()>;

    /// Close the dropdown
    async fn close(&self) -> Result<()>;

    /// Replace the query text
    async fn set_query_text(&self, text: &str) -> Result<()>;

    /// Run the current query
    async fn execute_query(&self) -> Result<()>;
}

/// Drives a [`SuggestionWidget`] against a source and a host
pub struct SuggestionController<S, H> {
    source: S,
    host: H,
    widget: Mutex<SuggestionWidget>,
}

impl<S: SuggestionSource, H: OmniboxHost> SuggestionController<S, H> {
    /// Controller with a default widget
    pub fn new(source: S, host: H, config: SuggestionsConfig) -> Self {
        Self::with_widget(source, host, SuggestionWidget::new(config))
    }

    /// Controller around an existing widget
    pub fn with_widget(source: S, host: H, widget: SuggestionWidget) -> Self {
        Self {
            source,
            host,
            widget: Mutex::new(widget),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Read widget state
    pub fn inspect<R>(&self, f: impl FnOnce(&SuggestionWidget) -> R) -> R {
        f(&self.widget.lock())
    }

    /// Populate the host dropdown
    ///
    /// Never fails: a failed fetch is logged and answered with no element so
    /// the host box keeps working.
    pub async fn handle_populate_request(&self, request: &PopulateRequest) -> PopulateResult {
        let params = self.widget.lock().top_queries_params(request);

        match self.source.top_queries(&params).await {
            Ok(suggestions) => {
                debug!(
                    "Fetched {} suggestions for '{}'",
                    suggestions.len(),
                    request.partial_query
                );
                self.widget.lock().apply_suggestions(request, suggestions)
            }
            Err(e) => {
                warn!(
                    "Failed to fetch suggestions for '{}': {}",
                    request.partial_query, e
                );
                self.widget.lock().apply_failure(request)
            }
        }
    }

    /// Select a displayed suggestion by label or position
    ///
    /// Returns `false` when no displayed row matches.
    pub async fn select_suggestion(&self, intent: impl Into<SelectionIntent>) -> Result<bool> {
        let intent = intent.into();
        let steps = self.widget.lock().select_intent(&intent);

        match steps {
            Some(steps) => {
                self.apply(steps).await?;
                Ok(true)
            }
            None => {
                debug!("No displayed suggestion matches {:?}", intent);
                Ok(false)
            }
        }
    }

    /// A suggestion was chosen for `request`
    pub async fn on_row_selection(&self, value: &str, request: &PopulateRequest) -> Result<()> {
        let steps = self.widget.lock().select(value, request);
        self.apply(steps).await
    }

    /// The host ran a query successfully
    pub fn on_query_success(&self) {
        self.widget.lock().on_query_success();
    }

    async fn apply(&self, steps: Vec<SelectionStep>) -> Result<()> {
        for step in steps {
            match step {
                SelectionStep::Clear => self.host.clear().await?,
                SelectionStep::Close => self.host.close().await?,
                SelectionStep::SetQueryText(text) => {
                    info!("Selected suggestion '{}'", text);
                    self.host.set_query_text(&text).await?;
                }
                SelectionStep::LogEvent(event) => {
                    match self.source.log_custom_event(&event).await {
                        Ok(()) => {}
                        Err(e) if e.is_transport() => {
                            warn!("Failed to deliver selection event: {}", e);
                        }
                        Err(e) => error!("Failed to log selection event: {}", e),
                    }
                }
                SelectionStep::ExecuteQuery => self.host.execute_query().await?,
            }
        }
        Ok(())
    }
}
