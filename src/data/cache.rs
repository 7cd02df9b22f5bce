//! TTL cache decorator for data sources.
//!
//! Wraps any `DataSource` and remembers successful fetches for a fixed
//! time-to-live. Errors are never cached, so a transient failure is
//! retried on the next request. The cache lives exactly as long as the
//! wrapper the caller owns.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{DataSource, FetchError};
use crate::types::TickerData;

struct CacheEntry {
    data: TickerData,
    inserted_at: DateTime<Utc>,
}

pub struct CachedDataSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<S: DataSource> CachedDataSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of entries held, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Drop entries older than the TTL.
    pub async fn evict_expired(&self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.entries
            .lock()
            .await
            .retain(|_, entry| now - entry.inserted_at < ttl);
    }

    /// Forget everything.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Fresh entry for `ticker`; a stale one is removed.
    async fn lookup(&self, ticker: &str) -> Option<TickerData> {
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(ticker)
            .map(|entry| Utc::now() - entry.inserted_at < self.ttl)?;
        if fresh {
            entries.get(ticker).map(|entry| entry.data.clone())
        } else {
            entries.remove(ticker);
            None
        }
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachedDataSource<S> {
    async fn fetch(&self, ticker: &str) -> Result<TickerData, FetchError> {
        if let Some(data) = self.lookup(ticker).await {
            debug!(ticker, source = self.inner.name(), "Cache hit");
            return Ok(data);
        }

        let data = self.inner.fetch(ticker).await?;
        self.evict_expired().await;
        self.entries.lock().await.insert(
            ticker.to_string(),
            CacheEntry {
                data: data.clone(),
                inserted_at: Utc::now(),
            },
        );
        Ok(data)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
