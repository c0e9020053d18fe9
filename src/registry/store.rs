//! Pool registry implementation
//!
//! The central map from stream URL to pool. All upstream connection
//! creation and teardown, and all metadata fan-out, goes through here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::protocol::FrameParser;
use crate::upstream::{fallback, ByteSource, UpstreamConnector};

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::event::PoolEvent;
use super::pool::{PoolShared, PoolState, PoolStats, SubscriberId};

/// A subscriber's push channel, as seen by the registry.
pub type EventSink = mpsc::UnboundedSender<PoolEvent>;

/// Central registry for all active pools.
///
/// One instance per server process, injected into whatever accepts
/// subscriptions. The URL is used verbatim as the map key: two textually
/// different URLs are different pools even if they resolve to the same
/// resource.
pub struct PoolRegistry<C: UpstreamConnector> {
    /// Map of stream URL to pool
    pools: RwLock<HashMap<String, Arc<PoolShared>>>,

    /// Opens upstream connections
    connector: C,

    /// Configuration
    config: RegistryConfig,

    /// Subscriber id allocator
    next_subscriber_id: AtomicU64,
}

impl<C: UpstreamConnector> PoolRegistry<C> {
    /// Create a registry with default configuration.
    pub fn new(connector: C) -> Self {
        Self::with_config(connector, RegistryConfig::default())
    }

    /// Create a registry with custom configuration.
    pub fn with_config(connector: C, config: RegistryConfig) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            connector,
            config,
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Attach `sink` to the pool for `url`, creating the pool (and its
    /// single upstream connection) if this is the first subscriber.
    ///
    /// The check-or-create runs under the map write lock, so two
    /// near-simultaneous subscribers for the same URL share one upstream
    /// connection. Returns the id used to [`unsubscribe`](Self::unsubscribe).
    pub async fn subscribe(
        self: &Arc<Self>,
        url: &str,
        sink: EventSink,
    ) -> Result<SubscriberId, RegistryError> {
        if !is_http_url(url) {
            return Err(RegistryError::InvalidStreamUrl(url.to_string()));
        }

        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        let mut pools = self.pools.write().await;

        if let Some(pool) = pools.get(url).cloned() {
            let mut inner = pool.inner.lock().await;
            // A closed pool still in the map is a teardown in progress;
            // treat it as absent and start fresh below
            if inner.state != PoolState::Closed {
                inner.add_subscriber(id, sink.clone());

                tracing::info!(
                    stream = %url,
                    subscribers = inner.subscribers.len(),
                    "Subscriber added (existing pool)"
                );

                // A stream already known to carry no metadata greets every
                // late joiner with the same one-time signal
                if inner.meta_interval == Some(0) {
                    let _ = sink.send(PoolEvent::NoMetadata);
                    self.schedule_linger_disconnect(url.to_string(), id);
                }
                return Ok(id);
            }
        }

        // First subscriber for this URL: create the pool and its pump task
        let pool = Arc::new(PoolShared::new(url.to_string()));
        pool.inner.lock().await.add_subscriber(id, sink);
        pools.insert(url.to_string(), Arc::clone(&pool));
        drop(pools);

        tracing::info!(stream = %url, "Pool created");
        tokio::spawn(Self::run_pool(Arc::clone(self), pool));

        Ok(id)
    }

    /// Detach a sink from the pool for `url`. Idempotent.
    ///
    /// When the last sink leaves, the upstream connection is released
    /// before this call returns and the pool entry is removed; a later
    /// subscribe for the same URL starts a brand-new pool.
    pub async fn unsubscribe(&self, url: &str, id: SubscriberId) {
        let mut pools = self.pools.write().await;

        let Some(pool) = pools.get(url).cloned() else {
            return;
        };

        let mut inner = pool.inner.lock().await;
        if !inner.remove_subscriber(id) {
            return;
        }

        tracing::debug!(
            stream = %url,
            subscribers = inner.subscribers.len(),
            "Subscriber removed"
        );

        if inner.subscribers.is_empty() && inner.state != PoolState::Closed {
            inner.close(None);
            drop(inner);
            if let Some(entry) = pools.get(url) {
                if Arc::ptr_eq(entry, &pool) {
                    pools.remove(url);
                }
            }
            tracing::info!(stream = %url, "Pool released (last subscriber left)");
        }
    }

    /// Number of live pools.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Statistics for the pool serving `url`, if one exists.
    pub async fn pool_stats(&self, url: &str) -> Option<PoolStats> {
        let pools = self.pools.read().await;
        let pool = pools.get(url)?.clone();
        drop(pools);

        let inner = pool.inner.lock().await;
        Some(PoolStats {
            subscriber_count: inner.subscribers.len(),
            state: inner.state,
            meta_interval: inner.meta_interval,
            fallback_attempted: inner.fallback_attempted,
        })
    }

    /// Upstream pump: connect, then feed every chunk through the frame
    /// parser and fan decoded blocks out, until EOF, error, or teardown.
    async fn run_pool(registry: Arc<Self>, pool: Arc<PoolShared>) {
        let url = pool.key.clone();

        let mut source = match registry.connector.connect(&url).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(stream = %url, error = %e, "Upstream connect failed");
                registry.handle_upstream_failure(&pool).await;
                return;
            }
        };

        let interval = source.meta_interval();
        let no_meta_ids = {
            let mut inner = pool.inner.lock().await;
            if inner.state == PoolState::Closed {
                // Every subscriber left while we were connecting
                source.handle().shutdown();
                return;
            }
            inner.handle = Some(source.handle());
            inner.meta_interval = Some(interval);
            inner.parser = Some(FrameParser::new(interval));
            inner.state = PoolState::Streaming;

            tracing::info!(
                stream = %url,
                metaint = interval,
                subscribers = inner.subscribers.len(),
                "Upstream streaming"
            );

            if interval == 0 {
                inner.fan_out(&PoolEvent::NoMetadata);
                inner.subscribers.keys().copied().collect()
            } else {
                Vec::new()
            }
        };
        for id in no_meta_ids {
            registry.schedule_linger_disconnect(url.clone(), id);
        }

        loop {
            match source.next_chunk().await {
                Ok(Some(chunk)) => {
                    let mut inner = pool.inner.lock().await;
                    if inner.state == PoolState::Closed {
                        return;
                    }
                    let blocks = match inner.parser.as_mut() {
                        Some(parser) => parser.feed(&chunk),
                        None => Vec::new(),
                    };
                    for block in blocks {
                        tracing::debug!(
                            stream = %url,
                            title = block.stream_title().unwrap_or(""),
                            "Metadata decoded"
                        );
                        inner.fan_out(&PoolEvent::Metadata(block));
                    }
                }
                Ok(None) => {
                    tracing::info!(stream = %url, "Upstream ended");
                    registry.close_pool(&pool, Some(PoolEvent::End)).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(stream = %url, error = %e, "Upstream error");
                    registry.handle_upstream_failure(&pool).await;
                    return;
                }
            }
        }
    }

    /// First failure runs the one-shot fallback fetch; a second failure,
    /// or a failed fallback, is pool-fatal.
    async fn handle_upstream_failure(&self, pool: &Arc<PoolShared>) {
        let url = &pool.key;

        let first_failure = {
            let mut inner = pool.inner.lock().await;
            if inner.state == PoolState::Closed {
                return;
            }
            inner.shutdown_upstream();
            if !inner.fallback_attempted && self.config.fallback_enabled {
                inner.fallback_attempted = true;
                inner.state = PoolState::FallbackAttempt;
                true
            } else {
                false
            }
        };

        if !first_failure {
            self.close_pool(pool, Some(PoolEvent::Error)).await;
            return;
        }

        match fallback::fetch_first_metadata(&self.connector, url).await {
            Ok(block) => {
                tracing::info!(
                    stream = %url,
                    title = block.stream_title().unwrap_or(""),
                    "Fallback fetch succeeded"
                );
                let mut inner = pool.inner.lock().await;
                if inner.state == PoolState::Closed {
                    return;
                }
                inner.state = PoolState::Streaming;
                inner.fan_out(&PoolEvent::Metadata(block));
                // The pooled upstream is gone; no further events will come.
                // The pool lives on until its subscribers disconnect.
            }
            Err(e) => {
                tracing::warn!(stream = %url, error = %e, "Fallback fetch failed");
                self.close_pool(pool, Some(PoolEvent::Error)).await;
            }
        }
    }

    /// Terminal teardown: fan out the final event, close every sink, drop
    /// the registry entry. Idempotent, and a no-op for a pool that has
    /// already been replaced in the map.
    async fn close_pool(&self, pool: &Arc<PoolShared>, final_event: Option<PoolEvent>) {
        {
            let mut inner = pool.inner.lock().await;
            if inner.state == PoolState::Closed {
                return;
            }
            inner.close(final_event.as_ref());
        }

        let mut pools = self.pools.write().await;
        if let Some(entry) = pools.get(&pool.key) {
            if Arc::ptr_eq(entry, pool) {
                pools.remove(&pool.key);
            }
        }
        tracing::info!(stream = %pool.key, "Pool closed");
    }

    /// A metadata-less stream sends one `nometadata` event and nothing
    /// more; disconnect the subscriber shortly after so it does not hang
    /// on a silent channel.
    fn schedule_linger_disconnect(self: &Arc<Self>, url: String, id: SubscriberId) {
        let registry = Arc::clone(self);
        let linger = self.config.no_metadata_linger;
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            registry.unsubscribe(&url, id).await;
        });
    }
}

/// The subscription surface only accepts http/https targets.
pub(crate) fn is_http_url(url: &str) -> bool {
    let prefix: String = url.chars().take(8).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("http://") || prefix.starts_with("https://")
}
