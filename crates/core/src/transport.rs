//! HTTP transport used by the analytics client
//!
//! The client only builds [`HttpRequest`]s and interprets [`HttpResponse`]s;
//! putting bytes on the wire is the [`Transport`]'s job. [`ReqwestTransport`]
//! is the default implementation.

use crate::error::ErrorResponse;
use crate::{OmnilyticsError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// HTTP method subset used by the analytics API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Fully built URL, query string included
    pub url: Url,
    /// Serialized body
    pub body: Option<String>,
    /// Content type of `body`
    pub content_type: Option<&'static str>,
    /// Token sent as `Authorization: Bearer`
    pub bearer_token: Option<String>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
            content_type: None,
            bearer_token: None,
        }
    }

    pub fn post_json(url: Url, body: String) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
            content_type: Some("application/json"),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }
}

/// Successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Fire-and-forget payload delivered on the beacon path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    /// URL including the `access_token` query parameter
    pub url: Url,
    /// Form-encoded `<paramName>=<json>` body
    pub body: String,
}

/// Wire access for the analytics client
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Perform `request`, failing with [`OmnilyticsError::Endpoint`] on a
    /// non-success status
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Hand `beacon` off for best-effort delivery without waiting on it.
    ///
    /// Returns `false` when beacons are unsupported, in which case the caller
    /// falls back to [`Transport::execute`].
    fn send_beacon(&self, beacon: Beacon) -> bool {
        let _ = beacon;
        false
    }
}

/// `reqwest`-backed transport
///
/// Clones share the underlying connection pool and the set of beacons still
/// in flight.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    beacons: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| OmnilyticsError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            beacons: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of beacons handed off but not yet delivered
    pub fn pending_beacons(&self) -> usize {
        let mut beacons = self.beacons.lock();
        beacons.retain(|handle| !handle.is_finished());
        beacons.len()
    }

    /// Wait for every beacon handed off so far
    ///
    /// A short-lived process calls this before its runtime shuts down, since
    /// dropping the runtime cancels undelivered beacons.
    pub async fn wait_for_beacons(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.beacons.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Beacon task failed: {}", e);
            }
        }
    }

    fn build(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
        };

        if let Some(token) = request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        builder
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("{:?} {}", request.method, request.url);

        let response = self
            .build(request)
            .send()
            .await
            .map_err(|e| OmnilyticsError::network(format!("Analytics request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OmnilyticsError::Endpoint(ErrorResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                data: body,
            }));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }

    fn send_beacon(&self, beacon: Beacon) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let request = self
            .client
            .post(beacon.url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(beacon.body);

        let handle = runtime.spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    warn!("Beacon rejected with status {}", response.status());
                }
                Ok(_) => debug!("Beacon delivered"),
                Err(e) => warn!("Beacon delivery failed: {}", e),
            }
        });

        let mut beacons = self.beacons.lock();
        beacons.retain(|handle| !handle.is_finished());
        beacons.push(handle);

        true
    }
}
