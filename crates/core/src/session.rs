//! Analytics session state
//!
//! An [`AnalyticsSession`] owns what the service considers one browsing
//! session: the cached visit id, the visitor cookie and the request queue that
//! keeps non-unload requests single-flight. Clients built on the same session
//! share all three.

use crate::cookies::{visitor_cookie_lifetime, CookieStore, MemoryCookieStore, VISITOR_COOKIE};
use crate::events::SessionIds;
use crate::queue::RequestQueue;
use crate::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared visit/visitor bookkeeping for one backend session
#[derive(Debug)]
pub struct AnalyticsSession {
    visit_id: RwLock<Option<String>>,
    cookies: Arc<dyn CookieStore>,
    queue: RequestQueue,
}

impl AnalyticsSession {
    /// Create a session backed by `cookies`
    ///
    /// The request queue spawns its consumer task here, so this fails outside
    /// of a tokio runtime.
    pub fn new(cookies: Arc<dyn CookieStore>) -> Result<Arc<Self>> {
        Self::with_settle_timeout(cookies, None)
    }

    /// Create a session whose queued requests time out after `settle_timeout`
    pub fn with_settle_timeout(
        cookies: Arc<dyn CookieStore>,
        settle_timeout: Option<Duration>,
    ) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            visit_id: RwLock::new(None),
            cookies,
            queue: RequestQueue::with_settle_timeout(settle_timeout)?,
        }))
    }

    /// Create a session with a throwaway cookie jar
    pub fn in_memory() -> Result<Arc<Self>> {
        Self::new(Arc::new(MemoryCookieStore::new()))
    }

    /// Cached visit id
    pub fn visit_id(&self) -> Option<String> {
        self.visit_id.read().clone()
    }

    /// Replace the cached visit id
    pub fn set_visit_id<S: Into<String>>(&self, visit_id: S) {
        let visit_id = visit_id.into();
        let mut current = self.visit_id.write();
        if current.as_deref() != Some(visit_id.as_str()) {
            info!("Analytics visit changed to {}", visit_id);
            *current = Some(visit_id);
        }
    }

    /// Visitor id from the cookie store
    pub fn visitor_id(&self) -> Option<String> {
        self.cookies.get(VISITOR_COOKIE)
    }

    /// Persist a visitor id for the full cookie lifetime
    pub fn set_visitor_id(&self, visitor_id: &str) {
        debug!("Writing visitor cookie");
        self.cookies
            .set(VISITOR_COOKIE, visitor_id, visitor_cookie_lifetime());
    }

    /// Apply identifiers echoed back by the service
    pub fn apply(&self, ids: &SessionIds) {
        if let Some(visit_id) = &ids.visit_id {
            self.set_visit_id(visit_id.as_str());
        }
        if let Some(visitor_id) = &ids.visitor_id {
            self.set_visitor_id(visitor_id);
        }
    }

    /// Queue serializing this session's non-unload requests
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Cookie store backing the visitor id
    pub fn cookies(&self) -> &Arc<dyn CookieStore> {
        &self.cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_updates_visit_and_cookie() {
        let cookies = Arc::new(MemoryCookieStore::new());
        let session = AnalyticsSession::new(cookies.clone()).unwrap();

        assert!(session.visit_id().is_none());
        assert!(session.visitor_id().is_none());

        session.apply(&SessionIds {
            visit_id: Some("visit-1".to_string()),
            visitor_id: Some("visitor-1".to_string()),
        });

        assert_eq!(session.visit_id().as_deref(), Some("visit-1"));
        assert_eq!(cookies.get(VISITOR_COOKIE).as_deref(), Some("visitor-1"));
    }

    #[tokio::test]
    async fn test_apply_partial_ids() {
        let session = AnalyticsSession::in_memory().unwrap();
        session.set_visit_id("kept");

        session.apply(&SessionIds {
            visit_id: None,
            visitor_id: Some("only-visitor".to_string()),
        });

        assert_eq!(session.visit_id().as_deref(), Some("kept"));
        assert_eq!(session.visitor_id().as_deref(), Some("only-visitor"));
    }

    #[test]
    fn test_session_needs_a_runtime() {
        assert!(AnalyticsSession::in_memory().is_err());
    }
}
