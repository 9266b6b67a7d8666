//! Suggestion render model and host interaction types

use omnilytics_core::CustomEvent;
use serde::{Deserialize, Serialize};

/// Prefix of generated row identifiers
pub const ROW_ID_PREFIX: &str = "omnilytics-suggestion";

/// Request from the host box to populate its dropdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateRequest {
    /// Text currently typed in the box
    pub partial_query: String,
}

impl PopulateRequest {
    pub fn new<S: Into<String>>(partial_query: S) -> Self {
        Self {
            partial_query: partial_query.into(),
        }
    }
}

/// One rendered suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRow {
    pub id: String,
    pub label: String,
    pub position: usize,
}

impl SuggestionRow {
    pub fn new<S: Into<String>>(label: S, position: usize) -> Self {
        Self {
            id: format!("{}-{}", ROW_ID_PREFIX, position),
            label: label.into(),
            position,
        }
    }
}

/// Everything needed to draw the suggestion dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderModel {
    pub header_title: String,
    pub rows: Vec<SuggestionRow>,
}

impl RenderModel {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Answer handed back to the host box
///
/// `element` is `None` when nothing should be drawn, including when the
/// suggestion fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateResult {
    pub element: Option<RenderModel>,
    pub z_index: i32,
}

/// Where a displayed row sits in the dropdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedSuggestion {
    pub row_id: String,
    pub position: usize,
}

/// How a caller designates the suggestion to select
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionIntent {
    /// Exact rendered label
    Label(String),
    /// Zero-based row position
    Position(usize),
}

impl From<&str> for SelectionIntent {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for SelectionIntent {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<usize> for SelectionIntent {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

/// One effect of selecting a suggestion, applied in order by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionStep {
    /// Empty the box's dropdown
    Clear,
    /// Close the dropdown
    Close,
    /// Replace the query text with the selected value
    SetQueryText(String),
    /// Log an analytics event
    LogEvent(CustomEvent),
    /// Run the query
    ExecuteQuery,
}
