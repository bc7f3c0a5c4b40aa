//! Listener notifier
//!
//! Keeps the set of live subscribers (one per dashboard connection) and
//! pushes full registry snapshots to them.
//!
//! ## Delivery
//!
//! ```text
//! notify_all() → registry.list() → deliver to every listener concurrently
//!                                         │
//!                                         └─ failed? → unsubscribed afterwards
//! ```
//!
//! A failing or slow listener never blocks the others: every delivery runs
//! concurrently and is bounded by [`DELIVERY_TIMEOUT`].
//!
//! Broadcasts are serialized. The registry is read and delivered under one
//! lock, so a listener never receives an older snapshot after a newer one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, trace, warn};

use crate::registry::{TargetRegistry, TargetSnapshot};

/// Upper bound for a single delivery before the listener counts as failed
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors a listener can report while receiving a snapshot
#[derive(Debug)]
pub enum DeliveryError {
    /// The underlying connection is gone
    Closed,

    /// The listener did not accept the snapshot in time
    Timeout(Duration),

    /// The snapshot could not be encoded for the transport
    Serialization(String),

    /// Transport-specific failure
    Transport(String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "listener connection closed"),
            DeliveryError::Timeout(after) => {
                write!(f, "listener did not accept snapshot within {after:?}")
            }
            DeliveryError::Serialization(msg) => write!(f, "failed to encode snapshot: {msg}"),
            DeliveryError::Transport(msg) => write!(f, "delivery failed: {msg}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        DeliveryError::Serialization(err.to_string())
    }
}

/// A subscriber that receives full snapshots
#[async_trait]
pub trait Listener: Send + Sync {
    async fn deliver(&self, snapshot: &[TargetSnapshot]) -> Result<(), DeliveryError>;
}

/// Identifies a subscription for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Listeners that accepted the snapshot
    pub delivered: usize,

    /// Listeners removed because delivery failed
    pub dropped: Vec<ListenerId>,
}

/// Fan-out of registry snapshots to subscribed listeners
#[derive(Clone)]
pub struct Notifier {
    registry: TargetRegistry,
    listeners: Arc<RwLock<HashMap<ListenerId, Arc<dyn Listener>>>>,
    next_id: Arc<AtomicU64>,
    /// Held from reading the registry until every delivery has finished
    broadcast: Arc<Mutex<()>>,
}

impl Notifier {
    pub fn new(registry: TargetRegistry) -> Self {
        Self {
            registry,
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            broadcast: Arc::new(Mutex::new(())),
        }
    }

    /// Register a listener for future broadcasts
    pub async fn subscribe(&self, listener: Arc<dyn Listener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().await.insert(id, listener);
        debug!("{id} subscribed");
        id
    }

    /// Remove a listener; removing an unknown id is a no-op
    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().await.remove(&id).is_some();
        if removed {
            debug!("{id} unsubscribed");
        }
        removed
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Deliver one fresh snapshot to a single listener
    pub async fn deliver_to(&self, listener: &dyn Listener) -> Result<(), DeliveryError> {
        let _broadcast = self.broadcast.lock().await;
        let snapshot = self.registry.list().await;
        deliver_bounded(listener, &snapshot).await
    }

    /// Push one snapshot to every listener, dropping those that fail
    #[instrument(skip(self))]
    pub async fn notify_all(&self) -> NotifyReport {
        let _broadcast = self.broadcast.lock().await;
        let snapshot = self.registry.list().await;

        // Deliver outside the lock so subscribe/unsubscribe are never blocked
        // behind a slow listener
        let listeners: Vec<(ListenerId, Arc<dyn Listener>)> = self
            .listeners
            .read()
            .await
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();

        if listeners.is_empty() {
            trace!("no listeners to notify");
            return NotifyReport::default();
        }

        let results = join_all(listeners.iter().map(|(id, listener)| {
            let snapshot = &snapshot;
            async move { (*id, deliver_bounded(listener.as_ref(), snapshot).await) }
        }))
        .await;

        let mut report = NotifyReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("error notifying {id}: {e}");
                    report.dropped.push(id);
                }
            }
        }

        if !report.dropped.is_empty() {
            let mut listeners = self.listeners.write().await;
            for id in &report.dropped {
                listeners.remove(id);
            }
        }

        trace!(
            "notified {} listeners ({} dropped) with {} targets",
            report.delivered,
            report.dropped.len(),
            snapshot.len()
        );

        report
    }
}

async fn deliver_bounded(
    listener: &dyn Listener,
    snapshot: &[TargetSnapshot],
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(DELIVERY_TIMEOUT, listener.deliver(snapshot)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(DELIVERY_TIMEOUT)),
    }
}
