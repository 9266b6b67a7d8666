//! Client-side cookie storage
//!
//! The analytics session keeps the long-lived visitor identifier in a cookie.
//! A [`CookieStore`] abstracts where that cookie lives so the client can run
//! with a throwaway in-memory jar or a persistent one (see the infra crate).

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the visitor cookie
pub const VISITOR_COOKIE: &str = "visitorId";

/// Lifetime of the visitor cookie in days
pub const VISITOR_COOKIE_DAYS: i64 = 10_000;

/// A stored cookie value with its expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCookie {
    /// Create a cookie that expires `lifetime` from now
    pub fn new<S: Into<String>>(value: S, lifetime: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Utc::now() + lifetime,
        }
    }

    /// Whether the cookie has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Storage backend for cookies
///
/// Implementations must be `Send + Sync`; a store is shared by every client
/// built on the same session.
pub trait CookieStore: Send + Sync + std::fmt::Debug {
    /// Current value of `name`, `None` if missing or expired
    fn get(&self, name: &str) -> Option<String>;

    /// Write `name`, replacing any previous value
    fn set(&self, name: &str, value: &str, lifetime: Duration);

    /// Remove `name`
    fn remove(&self, name: &str);
}

/// Non-persistent cookie store
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<HashMap<String, StoredCookie>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.read();
        cookies
            .get(name)
            .filter(|cookie| !cookie.is_expired_at(Utc::now()))
            .map(|cookie| cookie.value.clone())
    }

    fn set(&self, name: &str, value: &str, lifetime: Duration) {
        self.cookies
            .write()
            .insert(name.to_string(), StoredCookie::new(value, lifetime));
    }

    fn remove(&self, name: &str) {
        self.cookies.write().remove(name);
    }
}

/// Lifetime of the visitor cookie
pub fn visitor_cookie_lifetime() -> Duration {
    Duration::days(VISITOR_COOKIE_DAYS)
}
