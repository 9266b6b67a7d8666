//! File-backed cookie store
//!
//! Keeps cookies in a small JSON document so the visitor identifier survives
//! between runs of the command line tool, the same way a browser keeps it
//! across sessions.

use chrono::{Duration, Utc};
use omnilytics_core::config::CookieConfig;
use omnilytics_core::{CookieStore, MemoryCookieStore, OmnilyticsError, Result, StoredCookie};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Cookie store persisted as JSON at a fixed path
#[derive(Debug)]
pub struct FileCookieStore {
    path: PathBuf,
    cookies: RwLock<HashMap<String, StoredCookie>>,
    /// Held while writing so snapshots reach the disk in order
    write_lock: Mutex<()>,
}

impl FileCookieStore {
    /// Open the store at `path`, loading existing cookies
    ///
    /// A missing file is an empty store. Expired cookies are dropped on load.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut cookies: HashMap<String, StoredCookie> = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    OmnilyticsError::validation(format!(
                        "Invalid cookie file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            HashMap::new()
        };

        let now = Utc::now();
        cookies.retain(|_, cookie| !cookie.is_expired_at(now));
        debug!("Loaded {} cookies from {}", cookies.len(), path.display());

        Ok(Self {
            path,
            cookies: RwLock::new(cookies),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every cookie to disk
    ///
    /// The jar is replaced atomically through a uniquely named temporary file
    /// in the same directory, so a crash never leaves a truncated jar.
    pub fn persist(&self) -> Result<()> {
        let _writing = self.write_lock.lock();
        let content = serde_json::to_string_pretty(&*self.cookies.read())?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut staging = NamedTempFile::new_in(dir)?;
        staging.write_all(content.as_bytes())?;
        staging.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!("Failed to save cookies to {}: {}", self.path.display(), e);
        }
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .get(name)
            .filter(|cookie| !cookie.is_expired_at(Utc::now()))
            .map(|cookie| cookie.value.clone())
    }

    fn set(&self, name: &str, value: &str, lifetime: Duration) {
        self.cookies
            .write()
            .insert(name.to_string(), StoredCookie::new(value, lifetime));
        self.persist_or_warn();
    }

    fn remove(&self, name: &str) {
        let removed = self.cookies.write().remove(name).is_some();
        if removed {
            self.persist_or_warn();
        }
    }
}

/// Cookie store selected by the `cookies` configuration section
pub fn open_cookie_store(config: &CookieConfig) -> Result<Arc<dyn CookieStore>> {
    match &config.path {
        Some(path) => Ok(Arc::new(FileCookieStore::open(path)?)),
        None => Ok(Arc::new(MemoryCookieStore::new())),
    }
}
