//! Target registry
//!
//! The registry exclusively owns every [`Target`]. It is a cheap-to-clone
//! handle around a shared map, so the API layer and the scheduler can hold
//! their own copies and race safely: every mutation (add, remove, probe
//! write-back) takes the write lock, which makes per-target updates atomic
//! from a reader's point of view.

pub mod ring;
pub mod target;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use crate::monitors::ProbeOutcome;

pub use ring::RingBuffer;
pub use target::{StatusChange, Target, TargetSnapshot};

/// Shared collection of monitored targets keyed by URL
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Arc<RwLock<HashMap<String, Target>>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new target
    ///
    /// Returns `false` without touching the existing record if the URL is
    /// already registered.
    pub async fn add(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        let mut targets = self.targets.write().await;

        if targets.contains_key(&url) {
            debug!("target {url} already registered");
            return false;
        }

        targets.insert(url.clone(), Target::new(url.clone()));
        info!("added target: {url}");
        true
    }

    /// Drop a target and all its history
    ///
    /// Returns `false` if the URL was not registered.
    pub async fn remove(&self, url: &str) -> bool {
        let removed = self.targets.write().await.remove(url).is_some();
        if removed {
            info!("removed target: {url}");
        } else {
            debug!("target {url} not registered, nothing to remove");
        }
        removed
    }

    /// Computed views of every target, oldest registration first
    pub async fn list(&self) -> Vec<TargetSnapshot> {
        let targets = self.targets.read().await;
        let mut snapshots: Vec<TargetSnapshot> = targets.values().map(Target::snapshot).collect();
        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.url.cmp(&b.url))
        });
        snapshots
    }

    /// URLs currently registered, in the same order as [`list`](Self::list)
    pub async fn urls(&self) -> Vec<String> {
        let targets = self.targets.read().await;
        let mut entries: Vec<_> = targets
            .values()
            .map(|t| (t.created_at(), t.url().to_string()))
            .collect();
        entries.sort();
        entries.into_iter().map(|(_, url)| url).collect()
    }

    pub async fn get(&self, url: &str) -> Option<TargetSnapshot> {
        self.targets.read().await.get(url).map(Target::snapshot)
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.targets.read().await.contains_key(url)
    }

    pub async fn len(&self) -> usize {
        self.targets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.targets.read().await.is_empty()
    }

    /// Write a probe outcome back into its target
    ///
    /// Returns `false` if the target was removed while the probe was in
    /// flight; the outcome is discarded in that case.
    pub async fn record(&self, url: &str, outcome: &ProbeOutcome) -> bool {
        let mut targets = self.targets.write().await;

        let Some(target) = targets.get_mut(url) else {
            debug!("discarding probe result for removed target {url}");
            return false;
        };

        if let Some(change) = target.record(outcome, Utc::now()) {
            info!(
                "{url}: status changed from {} to {}",
                change.old_status, change.new_status
            );
        } else {
            trace!("{url}: status unchanged ({})", target.status());
        }

        true
    }
}
