//! Omnilytics Infrastructure Library
//!
//! Process-level services for the Omnilytics binaries: logging setup and
//! persistent cookie storage for the visitor identifier.

use omnilytics_core::{
    AnalyticsClient, AnalyticsSession, OmnilyticsConfig, ReqwestTransport, Result, Transport,
};
use std::sync::Arc;

pub mod cookie_jar;
pub mod logger;

pub use cookie_jar::{open_cookie_store, FileCookieStore};
pub use logger::*;

/// Infrastructure version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a client on a fresh session backed by the configured cookie store
///
/// Must be called from within a tokio runtime.
pub fn connect(config: &OmnilyticsConfig) -> Result<AnalyticsClient> {
    let transport = ReqwestTransport::new(config.analytics.timeout())?;
    connect_with_transport(config, Arc::new(transport))
}

/// Same as [`connect`] over a caller-supplied transport
pub fn connect_with_transport(
    config: &OmnilyticsConfig,
    transport: Arc<dyn Transport>,
) -> Result<AnalyticsClient> {
    let cookies = open_cookie_store(&config.cookies)?;
    let session =
        AnalyticsSession::with_settle_timeout(cookies, config.analytics.settle_timeout())?;

    tracing::debug!(
        "Connecting to {} ({})",
        config.analytics.service_url,
        config.analytics.version
    );
    Ok(AnalyticsClient::new(
        config.analytics.clone(),
        session,
        transport,
    ))
}
