//! Omnilytics Core Library
//!
//! Client for a hosted usage analytics service. This library owns the
//! analytics session (visit id, visitor cookie), serializes event requests so
//! that only one is in flight per session, and delivers unload-causing events
//! on a best-effort path that never blocks navigation.

pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod events;
pub mod queue;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use client::AnalyticsClient;
pub use config::{AnalyticsConfig, OmnilyticsConfig, SuggestionsConfig};
pub use cookies::{CookieStore, MemoryCookieStore, StoredCookie, VISITOR_COOKIE};
pub use error::{ErrorResponse, OmnilyticsError, Result};
pub use events::{
    ClickEvent, CustomEvent, EndpointKind, EventCommon, EventResponse, SearchEvent, SessionIds,
    TopQueriesParams,
};
pub use queue::RequestQueue;
pub use session::AnalyticsSession;
pub use transport::{Beacon, HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
