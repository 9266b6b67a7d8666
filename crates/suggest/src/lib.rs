//! Omnilytics query suggestions
//!
//! Renders popular queries from the analytics service as suggestions in a
//! host search box and logs an analytics event when one is selected. The
//! widget itself is a pure state machine; [`SuggestionController`] wires it
//! to the network and to an [`OmniboxHost`].

pub mod clean;
pub mod controller;
pub mod handler;
pub mod model;
pub mod widget;

pub use clean::{clean_custom_data, clean_custom_data_with_budget, CUSTOM_DATA_MAX_LENGTH};
pub use controller::{OmniboxHost, SuggestionController, SuggestionSource};
pub use handler::{
    DefaultSelectionHandler, SelectionContext, SelectionHandler, OMNIBOX_ACTION_CAUSE,
    OMNIBOX_ACTION_TYPE,
};
pub use model::{
    DisplayedSuggestion, PopulateRequest, PopulateResult, RenderModel, SelectionIntent,
    SelectionStep, SuggestionRow,
};
pub use widget::SuggestionWidget;
