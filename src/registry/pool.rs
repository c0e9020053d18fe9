//! Per-URL pool state
//!
//! One pool per distinct stream URL: the single upstream connection handle,
//! the running frame parser, and the subscriber sink set. All mutable state
//! sits behind one mutex, held for the duration of each chunk-processing or
//! subscribe/unsubscribe operation.

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};

use crate::protocol::FrameParser;
use crate::upstream::SourceHandle;

use super::event::PoolEvent;

/// Opaque identifier for one subscriber sink within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(super) u64);

/// State of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Upstream request in flight, headers not yet seen
    Connecting,
    /// Upstream body streaming, metadata being relayed
    Streaming,
    /// Upstream failed once, one-shot fallback fetch in flight
    FallbackAttempt,
    /// Terminal; the registry entry is deleted, never reused
    Closed,
}

/// A pool entry shared between the registry and its pump task.
pub(super) struct PoolShared {
    /// The verbatim stream URL this pool serves.
    pub key: String,
    pub inner: Mutex<PoolInner>,
}

impl PoolShared {
    pub fn new(key: String) -> Self {
        Self {
            key,
            inner: Mutex::new(PoolInner {
                state: PoolState::Connecting,
                meta_interval: None,
                parser: None,
                subscribers: HashMap::new(),
                fallback_attempted: false,
                handle: None,
            }),
        }
    }
}

/// Mutable pool state, guarded by the pool mutex.
pub(super) struct PoolInner {
    pub state: PoolState,

    /// `icy-metaint` from the upstream response; `None` until headers arrive,
    /// `Some(0)` for streams without embedded metadata.
    pub meta_interval: Option<usize>,

    /// Parser state carried across chunks; created once headers arrive.
    pub parser: Option<FrameParser>,

    /// Subscriber sinks, keyed for idempotent add/remove.
    pub subscribers: HashMap<SubscriberId, mpsc::UnboundedSender<PoolEvent>>,

    /// Set after the first one-shot fallback fetch, preventing repeats.
    pub fallback_attempted: bool,

    /// Shutdown handle for the live upstream connection.
    pub handle: Option<Box<dyn SourceHandle>>,
}

impl PoolInner {
    /// Add a sink. Returns false if the id was already present.
    pub fn add_subscriber(
        &mut self,
        id: SubscriberId,
        sink: mpsc::UnboundedSender<PoolEvent>,
    ) -> bool {
        self.subscribers.insert(id, sink).is_none()
    }

    /// Remove a sink. Returns false if the id was not present.
    pub fn remove_subscriber(&mut self, id: SubscriberId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Push an event to every current subscriber.
    ///
    /// Iterates a snapshot of the sink set; a sink whose receiver is gone
    /// is skipped and cleaned up by its own session's unsubscribe.
    pub fn fan_out(&self, event: &PoolEvent) {
        let sinks: Vec<_> = self.subscribers.values().cloned().collect();
        for sink in sinks {
            if sink.send(event.clone()).is_err() {
                tracing::trace!(event = event.name(), "Sink already closed, skipping");
            }
        }
    }

    /// Release the upstream connection. Safe to call repeatedly.
    pub fn shutdown_upstream(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
        }
    }

    /// Terminal teardown: optionally fan out a final event, then close every
    /// sink and release the upstream. Idempotent.
    pub fn close(&mut self, final_event: Option<&PoolEvent>) {
        if self.state == PoolState::Closed {
            return;
        }
        if let Some(event) = final_event {
            self.fan_out(event);
        }
        // Dropping the senders ends each subscriber's event stream
        self.subscribers.clear();
        self.shutdown_upstream();
        self.state = PoolState::Closed;
    }
}

/// Statistics for a pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Number of attached subscriber sinks
    pub subscriber_count: usize,
    /// Current pool state
    pub state: PoolState,
    /// Declared metadata interval, if headers have arrived
    pub meta_interval: Option<usize>,
    /// Whether the one-shot fallback has been spent
    pub fallback_attempted: bool,
}
