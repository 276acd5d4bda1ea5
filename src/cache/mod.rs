//! Rendered page cache
//!
//! Pages rendered by the server are kept with the time they were rendered.
//! A page older than its regeneration interval is rendered again on the
//! next request; if that fails, the stale copy keeps being served.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// A rendered page
#[derive(Debug, Clone)]
struct CacheEntry {
    html: String,
    rendered_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.rendered_at.elapsed() < ttl
    }
}

/// Rendered pages keyed by request path
#[derive(Debug, Default)]
pub struct PageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached page for `key`, rendering it when missing or older
    /// than `ttl`.
    ///
    /// `render` yields `Ok(None)` when the page does not exist; the entry is
    /// then dropped. A render error is returned only when there is no
    /// previous copy to fall back on.
    pub async fn get_or_render<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        render: F,
    ) -> Result<Option<String>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<String>, E>>,
        E: Display,
    {
        let stale = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(ttl) => {
                    tracing::debug!("Cache hit: {}", key);
                    return Ok(Some(entry.html.clone()));
                }
                Some(entry) => Some(entry.html.clone()),
                None => None,
            }
        };

        match render().await {
            Ok(Some(html)) => {
                tracing::debug!("Rendered: {}", key);
                self.entries.write().await.insert(
                    key.to_string(),
                    CacheEntry {
                        html: html.clone(),
                        rendered_at: Instant::now(),
                    },
                );
                Ok(Some(html))
            }
            Ok(None) => {
                self.invalidate(key).await;
                Ok(None)
            }
            Err(e) => match stale {
                Some(html) => {
                    tracing::warn!("Failed to regenerate {}, serving stale page: {}", key, e);
                    Ok(Some(html))
                }
                None => Err(e),
            },
        }
    }

    /// Store a page rendered ahead of time
    pub async fn insert(&self, key: &str, html: String) {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                html,
                rendered_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
