//! Analytics event payloads and service responses
//!
//! Payload field names follow the service's camelCase wire format. Responses
//! are decoded according to the endpoint they came from, see
//! [`EndpointKind::parse_response`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Fields shared by every event kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCommon {
    /// What caused the event, e.g. `omniboxAnalytics`
    pub action_cause: String,
    /// Family of the cause, e.g. `omnibox`
    pub action_type: String,
    /// Interface language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Device or user agent description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Search hub
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_level1: Option<String>,
    /// Tab or interface section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_level2: Option<String>,
    /// Referrer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_level3: Option<String>,
    /// Whether the user is anonymous
    #[serde(default)]
    pub anonymous: bool,
    /// Scalar custom dimensions
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_data: Map<String, Value>,
}

impl EventCommon {
    /// Create the common block for a cause/type pair
    pub fn new<C: Into<String>, T: Into<String>>(action_cause: C, action_type: T) -> Self {
        Self {
            action_cause: action_cause.into(),
            action_type: action_type.into(),
            ..Default::default()
        }
    }
}

/// Event logged after a query was executed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    /// Identifier of the query this event describes
    pub search_query_uid: String,
    /// Basic query expression
    pub query_text: String,
    /// Advanced query expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_query: Option<String>,
    /// Total number of results
    pub number_of_results: u64,
    /// Query duration in milliseconds
    pub response_time: u64,
    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_per_page: Option<u32>,
    /// Pipeline that handled the query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_pipeline: Option<String>,
}

/// Event logged when a result document is opened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    /// Identifier of the query that returned the document
    pub search_query_uid: String,
    /// Document URI
    pub document_uri: String,
    /// Hash of the document URI
    pub document_uri_hash: String,
    /// Document URL opened by the user
    pub document_url: String,
    /// Document title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,
    /// One-based rank of the document in the result list
    pub document_position: u32,
    /// Source the document belongs to
    pub source_name: String,
    /// Collection the document belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

/// Free-form event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    /// Event type, mirrors the action type by default
    pub event_type: String,
    /// Event value, mirrors the action cause by default
    pub event_value: String,
    /// Last query the user performed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_search_query_uid: Option<String>,
}

impl CustomEvent {
    /// Create a custom event for a cause/type pair
    pub fn new<C: Into<String>, T: Into<String>>(action_cause: C, action_type: T) -> Self {
        let common = EventCommon::new(action_cause, action_type);
        Self {
            event_type: common.action_type.clone(),
            event_value: common.action_cause.clone(),
            common,
            last_search_query_uid: None,
        }
    }

    /// Attach a custom dimension
    pub fn with_custom_data<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.common.custom_data.insert(key.into(), value.into());
        self
    }

    /// Set the interface language
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.common.language = Some(language.into());
        self
    }

    /// Set the search hub
    pub fn with_origin<S: Into<String>>(mut self, origin_level1: S) -> Self {
        self.common.origin_level1 = Some(origin_level1.into());
        self
    }

    /// Look up a custom dimension
    pub fn custom_value(&self, key: &str) -> Option<&Value> {
        self.common.custom_data.get(key)
    }
}

/// Visit and visitor identifiers echoed back by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIds {
    #[serde(default)]
    pub visit_id: Option<String>,
    #[serde(default)]
    pub visitor_id: Option<String>,
}

impl SessionIds {
    /// String identifiers found in a decoded response object
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            visit_id: field("visitId"),
            visitor_id: field("visitorId"),
        }
    }
}

/// Decoded response of an event POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum EventResponse {
    /// Response to a single click or custom event
    Single(SessionIds),
    /// Response to a batch of search events, one entry per event
    Batch(Vec<SessionIds>),
}

impl EventResponse {
    /// Identifiers that should update the session
    pub fn session_ids(&self) -> Option<&SessionIds> {
        match self {
            Self::Single(ids) => Some(ids),
            Self::Batch(responses) => responses.first(),
        }
    }
}

/// Response of the visit endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct VisitResponse {
    #[serde(alias = "visitId")]
    pub id: String,
}

/// Analytics sub-paths that accept event POSTs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Searches,
    Click,
    Custom,
}

impl EndpointKind {
    /// Path segment under `/analytics/`
    pub fn path(&self) -> &'static str {
        match self {
            Self::Searches => "searches",
            Self::Click => "click",
            Self::Custom => "custom",
        }
    }

    /// Name the payload is tagged with in form-encoded bodies
    pub fn param_name(&self) -> &'static str {
        match self {
            Self::Searches => "searchEvents",
            Self::Click => "clickEvent",
            Self::Custom => "customEvent",
        }
    }

    /// Decode a response body sent back by this endpoint
    ///
    /// The event was accepted once the service answered with a success
    /// status, so a body that does not decode only means no identifiers were
    /// discovered. Identifiers that are not strings are ignored one by one.
    pub fn parse_response(&self, body: &str) -> EventResponse {
        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|e| {
                warn!("Undecodable {} response body: {}", self.path(), e);
                Value::Null
            })
        };

        match self {
            Self::Searches => EventResponse::Batch(
                value
                    .get("searchEventResponses")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(SessionIds::from_value).collect())
                    .unwrap_or_default(),
            ),
            Self::Click | Self::Custom => EventResponse::Single(SessionIds::from_value(&value)),
        }
    }
}

/// Parameters of the top queries statistics call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopQueriesParams {
    pub page_size: usize,
    pub query_text: String,
    /// Additional query string parameters passed through verbatim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl TopQueriesParams {
    pub fn new<S: Into<String>>(page_size: usize, query_text: S) -> Self {
        Self {
            page_size,
            query_text: query_text.into(),
            extra: Vec::new(),
        }
    }

    /// Pass an extra parameter through to the service
    pub fn with_param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Query string pairs in wire order
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("pageSize".to_string(), self.page_size.to_string()),
            ("queryText".to_string(), self.query_text.clone()),
        ];
        pairs.extend(self.extra.iter().cloned());
        pairs
    }
}
