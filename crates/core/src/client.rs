//! Analytics service client
//!
//! [`AnalyticsClient`] builds every call the usage analytics service accepts
//! and keeps the session's visit and visitor identifiers up to date from the
//! responses. Event POSTs go through the session's [`RequestQueue`] so at most
//! one is in flight per session; document views are the exception because
//! they usually precede a navigation and must not wait behind other calls.
//!
//! [`RequestQueue`]: crate::queue::RequestQueue

use crate::config::AnalyticsConfig;
use crate::events::{
    ClickEvent, CustomEvent, EndpointKind, EventResponse, SearchEvent, TopQueriesParams,
    VisitResponse,
};
use crate::session::AnalyticsSession;
use crate::transport::{Beacon, HttpRequest, ReqwestTransport, Transport};
use crate::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use url::{form_urlencoded, Url};

/// Client for the usage analytics REST API
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: AnalyticsConfig,
    session: Arc<AnalyticsSession>,
    transport: Arc<dyn Transport>,
}

impl AnalyticsClient {
    /// Create a client on an existing session and transport
    pub fn new(
        config: AnalyticsConfig,
        session: Arc<AnalyticsSession>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                session,
                transport,
            }),
        }
    }

    /// Create a client using the default `reqwest` transport
    pub fn from_config(config: AnalyticsConfig, session: Arc<AnalyticsSession>) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(config, session, Arc::new(transport)))
    }

    /// Client configuration
    pub fn config(&self) -> &AnalyticsConfig {
        &self.inner.config
    }

    /// Session shared with other clients
    pub fn session(&self) -> &Arc<AnalyticsSession> {
        &self.inner.session
    }

    /// Cached visit id, no I/O
    pub fn current_visit_id(&self) -> Option<String> {
        self.inner.session.visit_id()
    }

    /// Cached visit id, fetched from the visit endpoint when missing
    pub async fn visit_id(&self) -> Result<String> {
        if let Some(visit_id) = self.current_visit_id() {
            return Ok(visit_id);
        }

        let url = self.inner.analytics_url("visit")?;
        let visit: VisitResponse = self.inner.get_from_service(url, Vec::new()).await?;
        self.inner.session.set_visit_id(visit.id.as_str());
        Ok(visit.id)
    }

    /// Post a batch of search events
    ///
    /// An empty batch is skipped without any network call.
    pub async fn send_search_events(
        &self,
        events: &[SearchEvent],
    ) -> Result<Option<EventResponse>> {
        if events.is_empty() {
            debug!("No search events to send");
            return Ok(None);
        }

        let payload = serde_json::to_string(events)?;
        self.send_to_service(EndpointKind::Searches, payload)
            .await
            .map(Some)
    }

    /// Post a document view
    ///
    /// Delivered on the unload-safe path: a beacon when the transport supports
    /// it (no response is available, `Ok(None)`), otherwise an immediate
    /// request that does not wait for queued calls.
    pub async fn send_document_view_event(
        &self,
        event: &ClickEvent,
    ) -> Result<Option<EventResponse>> {
        let payload = serde_json::to_string(event)?;
        self.inner
            .send_unload_causing(EndpointKind::Click, payload)
            .await
    }

    /// Post a custom event
    pub async fn send_custom_event(&self, event: &CustomEvent) -> Result<EventResponse> {
        let payload = serde_json::to_string(event)?;
        self.send_to_service(EndpointKind::Custom, payload).await
    }

    /// Ranked popular queries matching the parameters
    pub async fn top_queries(&self, params: &TopQueriesParams) -> Result<Vec<String>> {
        let url = self.inner.api_url("stats/topQueries")?;
        self.inner
            .get_from_service(url, params.to_query_pairs())
            .await
    }

    async fn send_to_service(&self, kind: EndpointKind, payload: String) -> Result<EventResponse> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .session
            .queue()
            .run(move || async move { inner.post_event(kind, payload).await })
            .await
    }
}

impl ClientInner {
    /// `{serviceUrl}/rest/{version}/{path}`
    fn api_url(&self, path: &str) -> Result<Url> {
        let base = self.config.service_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!(
            "{}/rest/{}/{}",
            base, self.config.version, path
        ))?;
        Ok(url)
    }

    fn analytics_url(&self, path: &str) -> Result<Url> {
        self.api_url(&format!("analytics/{}", path))
    }

    /// Event URL carrying `org` and the visitor cookie as read right now
    fn event_url(&self, kind: EndpointKind) -> Result<Url> {
        let mut url = self.analytics_url(kind.path())?;
        let mut pairs = Vec::new();
        if let Some(organization) = &self.config.organization {
            pairs.push(("org".to_string(), organization.clone()));
        }
        if let Some(visitor) = self.session.visitor_id() {
            pairs.push(("visitor".to_string(), visitor));
        }
        append_query(&mut url, &pairs);
        Ok(url)
    }

    async fn post_event(&self, kind: EndpointKind, payload: String) -> Result<EventResponse> {
        let url = self.event_url(kind)?;
        debug!("Sending {} event to {}", kind.path(), url.path());

        let request =
            HttpRequest::post_json(url, payload).with_bearer_token(self.config.token.clone());
        let response = self.transport.execute(request).await?;

        let decoded = kind.parse_response(&response.body);
        if let Some(ids) = decoded.session_ids() {
            self.session.apply(ids);
        }
        Ok(decoded)
    }

    async fn send_unload_causing(
        &self,
        kind: EndpointKind,
        payload: String,
    ) -> Result<Option<EventResponse>> {
        let mut url = self.event_url(kind)?;
        if let Some(token) = &self.config.token {
            append_query(&mut url, &[("access_token".to_string(), token.clone())]);
        }

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair(kind.param_name(), &payload)
            .finish();

        if self.transport.send_beacon(Beacon { url, body }) {
            info!("Sent {} event as beacon", kind.path());
            return Ok(None);
        }

        debug!("Beacon unavailable, sending {} event directly", kind.path());
        self.post_event(kind, payload).await.map(Some)
    }

    async fn get_from_service<T: DeserializeOwned>(
        &self,
        mut url: Url,
        params: Vec<(String, String)>,
    ) -> Result<T> {
        let mut pairs = Vec::with_capacity(params.len() + 2);
        if let Some(organization) = &self.config.organization {
            pairs.push(("org".to_string(), organization.clone()));
        }
        if let Some(token) = &self.config.token {
            pairs.push(("access_token".to_string(), token.clone()));
        }
        pairs.extend(params);
        append_query(&mut url, &pairs);

        debug!("Fetching {}", url.path());
        let response = self.transport.execute(HttpRequest::get(url)).await?;
        Ok(serde_json::from_str(&response.body)?)
    }
}

/// Append `pairs` to the query string, leaving a query-less URL untouched
/// when there is nothing to add
fn append_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }
    url.query_pairs_mut().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::MemoryCookieStore;

    fn client(config: AnalyticsConfig) -> AnalyticsClient {
        let session = AnalyticsSession::new(Arc::new(MemoryCookieStore::new())).unwrap();
        AnalyticsClient::from_config(config, session).unwrap()
    }

    #[tokio::test]
    async fn test_api_url_joins_base_and_version() {
        let config = AnalyticsConfig::new(Url::parse("https://analytics.example.com").unwrap());
        let client = client(config);

        let url = client.inner.analytics_url("custom").unwrap();
        assert_eq!(
            url.as_str(),
            "https://analytics.example.com/rest/v15/analytics/custom"
        );

        let url = client.inner.api_url("stats/topQueries").unwrap();
        assert_eq!(
            url.as_str(),
            "https://analytics.example.com/rest/v15/stats/topQueries"
        );
    }

    #[tokio::test]
    async fn test_api_url_keeps_base_path() {
        let config = AnalyticsConfig::new(Url::parse("https://proxy.example.com/ua/").unwrap());
        let client = client(config);

        let url = client.inner.analytics_url("visit").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.example.com/ua/rest/v15/analytics/visit"
        );
    }

    #[tokio::test]
    async fn test_event_url_query() {
        let config = AnalyticsConfig::new(Url::parse("https://analytics.example.com").unwrap())
            .with_organization("acme");
        let client = client(config);

        let url = client.inner.event_url(EndpointKind::Searches).unwrap();
        assert_eq!(url.query(), Some("org=acme"));

        client.session().set_visitor_id("v 1");
        let url = client.inner.event_url(EndpointKind::Searches).unwrap();
        assert_eq!(url.query(), Some("org=acme&visitor=v+1"));
    }

    #[tokio::test]
    async fn test_event_url_without_org_or_visitor() {
        let config = AnalyticsConfig::new(Url::parse("https://analytics.example.com").unwrap());
        let client = client(config);

        let url = client.inner.event_url(EndpointKind::Click).unwrap();
        assert_eq!(url.query(), None);
    }
}
