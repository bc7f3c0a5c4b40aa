//! Helper types for integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use site_monitor::{
    DeliveryError, Listener, MonitorEngine, MonitorSettings, ProbeOutcome, Prober, TargetSnapshot,
};
use tokio::sync::Mutex;

/// Prober whose answers are scripted per URL
///
/// Unscripted URLs are reported as unreachable.
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn respond(&self, url: &str, status_code: u16, elapsed_ms: u64) {
        self.set(
            url,
            ProbeOutcome::Responded {
                status_code,
                elapsed_ms,
            },
        )
        .await;
    }

    pub async fn time_out(&self, url: &str) {
        self.set(
            url,
            ProbeOutcome::Unreachable {
                reason: "timed out".to_string(),
            },
        )
        .await;
    }

    pub async fn set(&self, url: &str, outcome: ProbeOutcome) {
        self.outcomes.lock().await.insert(url.to_string(), outcome);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .await
            .get(url)
            .cloned()
            .unwrap_or(ProbeOutcome::Unreachable {
                reason: "unscripted".to_string(),
            });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Listener that keeps every snapshot it receives
#[derive(Default)]
pub struct RecordingListener {
    pub received: Mutex<Vec<Vec<TargetSnapshot>>>,
    first_delay: Option<Duration>,
    deliveries: AtomicUsize,
}

impl RecordingListener {
    /// Stall only the first delivery, like a client on a slow link
    pub fn slow_first(delay: Duration) -> Self {
        Self {
            first_delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn count(&self) -> usize {
        self.received.lock().await.len()
    }

    pub async fn last(&self) -> Option<Vec<TargetSnapshot>> {
        self.received.lock().await.last().cloned()
    }
}

#[async_trait]
impl Listener for RecordingListener {
    async fn deliver(&self, snapshot: &[TargetSnapshot]) -> Result<(), DeliveryError> {
        let first = self.deliveries.fetch_add(1, Ordering::SeqCst) == 0;
        if let (true, Some(delay)) = (first, self.first_delay) {
            tokio::time::sleep(delay).await;
        }
        self.received.lock().await.push(snapshot.to_vec());
        Ok(())
    }
}

/// Listener that accepts a number of deliveries, then fails forever
pub struct FlakyListener {
    remaining: AtomicUsize,
    pub attempts: AtomicUsize,
}

impl FlakyListener {
    pub fn failing_after(successes: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(successes),
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Listener for FlakyListener {
    async fn deliver(&self, _snapshot: &[TargetSnapshot]) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(DeliveryError::Transport("connection reset".to_string()));
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn engine_with(prober: Arc<ScriptedProber>) -> MonitorEngine {
    MonitorEngine::new(MonitorSettings::default(), prober)
}

pub fn find<'a>(snapshot: &'a [TargetSnapshot], url: &str) -> Option<&'a TargetSnapshot> {
    snapshot.iter().find(|t| t.url == url)
}
