//! Monitor engine
//!
//! Explicitly constructed owner of the registry, the notifier and the
//! prober. The entry point builds one engine and hands clones to the API
//! layer and the scheduler; there is no global state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::actors::messages::TickSummary;
use crate::actors::scheduler::{DEFAULT_INTERVAL_SECS, ProbeCycle, SchedulerHandle};
use crate::monitors::http::DEFAULT_TIMEOUT_SECS;
use crate::monitors::{HttpProber, Prober};
use crate::notifier::{DeliveryError, Listener, ListenerId, Notifier, NotifyReport};
use crate::registry::{TargetRegistry, TargetSnapshot};

/// Timing knobs of the monitoring cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Delay between ticks
    pub interval: Duration,

    /// Per-probe request timeout
    pub timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Cheap-to-clone handle over the whole monitoring engine
#[derive(Clone)]
pub struct MonitorEngine {
    registry: TargetRegistry,
    notifier: Notifier,
    cycle: ProbeCycle,
    settings: MonitorSettings,
}

impl MonitorEngine {
    /// Build an engine around an arbitrary prober
    pub fn new(settings: MonitorSettings, prober: Arc<dyn Prober>) -> Self {
        let registry = TargetRegistry::new();
        let notifier = Notifier::new(registry.clone());
        let cycle = ProbeCycle::new(registry.clone(), notifier.clone(), prober);

        Self {
            registry,
            notifier,
            cycle,
            settings,
        }
    }

    /// Build an engine that probes over real HTTP
    pub fn with_http_prober(settings: MonitorSettings) -> Result<Self> {
        let prober = HttpProber::new(settings.timeout)?;
        Ok(Self::new(settings, Arc::new(prober)))
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Register a target and push the new topology to listeners
    pub async fn add_target(&self, url: impl Into<String>) -> bool {
        let added = self.registry.add(url).await;
        if added {
            self.notifier.notify_all().await;
        }
        added
    }

    /// Remove a target and push the new topology to listeners
    pub async fn remove_target(&self, url: &str) -> bool {
        let removed = self.registry.remove(url).await;
        if removed {
            self.notifier.notify_all().await;
        }
        removed
    }

    pub async fn targets(&self) -> Vec<TargetSnapshot> {
        self.registry.list().await
    }

    /// Subscribe a listener and send it the current state right away
    ///
    /// If that initial delivery fails the subscription is rolled back.
    pub async fn subscribe(&self, listener: Arc<dyn Listener>) -> Result<ListenerId, DeliveryError> {
        let id = self.notifier.subscribe(listener.clone()).await;

        if let Err(e) = self.notifier.deliver_to(listener.as_ref()).await {
            debug!("initial sync for {id} failed: {e}");
            self.notifier.unsubscribe(id).await;
            return Err(e);
        }

        Ok(id)
    }

    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id).await
    }

    pub async fn notify_all(&self) -> NotifyReport {
        self.notifier.notify_all().await
    }

    /// Run one tick inline, outside the scheduler actor
    pub async fn run_tick(&self) -> TickSummary {
        self.cycle.run_tick().await
    }

    /// Start the repeating monitoring cycle
    pub fn spawn_scheduler(&self) -> SchedulerHandle {
        info!(
            "scheduling probes every {:?} (timeout {:?})",
            self.settings.interval, self.settings.timeout
        );
        SchedulerHandle::spawn(self.cycle.clone(), self.settings.interval)
    }
}
