//! Common test helpers for analytics client tests

#![allow(dead_code)]

use async_trait::async_trait;
use omnilytics_core::{
    AnalyticsClient, AnalyticsConfig, AnalyticsSession, Beacon, HttpRequest, HttpResponse,
    MemoryCookieStore, Result, Transport,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Transport that records every call instead of touching the network
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<HttpRequest>>,
    pub beacons: Mutex<Vec<Beacon>>,
    pub log: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Delay applied to the first executed request only
    pub first_delay: Option<Duration>,
    pub response_body: String,
    pub supports_beacon: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = Some(delay);
        self
    }

    pub fn with_response_body(mut self, body: &str) -> Self {
        self.response_body = body.to_string();
        self
    }

    pub fn with_beacon_support(mut self) -> Self {
        self.supports_beacon = true;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let index = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.log.lock().push(format!("start:{}", index));

        if index == 1 {
            if let Some(delay) = self.first_delay {
                tokio::time::sleep(delay).await;
            }
        }

        self.log.lock().push(format!("end:{}", index));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(HttpResponse {
            status: 200,
            body: self.response_body.clone(),
        })
    }

    fn send_beacon(&self, beacon: Beacon) -> bool {
        if !self.supports_beacon {
            return false;
        }
        self.log.lock().push("beacon".to_string());
        self.beacons.lock().push(beacon);
        true
    }
}

/// Configuration pointing at `base`
pub fn config_for(base: &str) -> AnalyticsConfig {
    AnalyticsConfig::new(Url::parse(base).expect("valid test url"))
}

/// Client on a fresh in-memory session using `transport`
pub fn client_with(
    config: AnalyticsConfig,
    transport: Arc<RecordingTransport>,
) -> (AnalyticsClient, Arc<MemoryCookieStore>) {
    let cookies = Arc::new(MemoryCookieStore::new());
    let session = AnalyticsSession::new(cookies.clone()).expect("inside a runtime");
    (AnalyticsClient::new(config, session, transport), cookies)
}

/// Client on a fresh in-memory session using the reqwest transport
pub fn http_client(config: AnalyticsConfig) -> (AnalyticsClient, Arc<MemoryCookieStore>) {
    let cookies = Arc::new(MemoryCookieStore::new());
    let session = AnalyticsSession::new(cookies.clone()).expect("inside a runtime");
    let client = AnalyticsClient::from_config(config, session).expect("client builds");
    (client, cookies)
}
