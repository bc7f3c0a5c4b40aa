//! ProbeSchedulerActor - drives the monitoring cycle
//!
//! One actor serves every registered target. Each tick snapshots the target
//! list, probes all targets concurrently, writes the outcomes back into the
//! registry and finally broadcasts one snapshot to all listeners.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → urls() → probe ×N (concurrent) → record ×N → notify_all()
//!     ↑
//!     └─── Commands (CheckNow, UpdateInterval, Shutdown)
//! ```
//!
//! Ticks never overlap: the actor handles timer ticks and commands one at a
//! time, and a tick only returns once every probe and the broadcast are done.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::monitors::{ProbeOutcome, Prober};
use crate::notifier::Notifier;
use crate::registry::TargetRegistry;

use super::messages::{SchedulerCommand, TickSummary};

/// Default tick interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// One full probe-record-notify pass over the registry
///
/// Kept separate from the actor loop so callers (and tests) can run a tick
/// deterministically without a timer.
#[derive(Clone)]
pub struct ProbeCycle {
    registry: TargetRegistry,
    notifier: Notifier,
    prober: Arc<dyn Prober>,
}

impl ProbeCycle {
    pub fn new(registry: TargetRegistry, notifier: Notifier, prober: Arc<dyn Prober>) -> Self {
        Self {
            registry,
            notifier,
            prober,
        }
    }

    /// Probe every registered target, then notify listeners once
    ///
    /// An empty registry skips both probing and notification.
    #[instrument(skip(self))]
    pub async fn run_tick(&self) -> TickSummary {
        let urls = self.registry.urls().await;
        if urls.is_empty() {
            trace!("no targets registered, skipping tick");
            return TickSummary::default();
        }

        debug!("probing {} targets", urls.len());

        // Each probe runs in its own task so a panicking prober is contained
        // to its target
        let probes = urls.into_iter().map(|url| {
            let prober = self.prober.clone();
            let registry = self.registry.clone();
            async move {
                let task_url = url.clone();
                let outcome =
                    match tokio::spawn(async move { prober.probe(&task_url).await }).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!("unexpected error checking {url}: {e}");
                            ProbeOutcome::Failed {
                                reason: format!("probe task failed: {e}"),
                            }
                        }
                    };

                let applied = registry.record(&url, &outcome).await;
                (outcome, applied)
            }
        });

        let results = join_all(probes).await;

        let mut summary = TickSummary {
            probed: results.len(),
            ..TickSummary::default()
        };
        for (outcome, applied) in &results {
            if !applied {
                summary.discarded += 1;
            } else if outcome.is_up() {
                summary.up += 1;
            } else {
                summary.down += 1;
            }
        }

        let report = self.notifier.notify_all().await;
        summary.notified = report.delivered;

        debug!(
            "tick complete: {} up, {} down, {} discarded",
            summary.up, summary.down, summary.discarded
        );

        summary
    }
}

/// Actor that repeats the probe cycle on a fixed interval
pub struct ProbeSchedulerActor {
    /// The work performed on each tick
    cycle: ProbeCycle,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Current tick interval
    interval_duration: Duration,
}

impl ProbeSchedulerActor {
    pub fn new(
        cycle: ProbeCycle,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            cycle,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// The first tick fires immediately. The loop runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(interval = ?self.interval_duration))]
    pub async fn run(mut self) {
        info!("starting monitor loop");

        let mut ticker = self.new_ticker();

        loop {
            tokio::select! {
                // Timer tick - probe everything
                _ = ticker.tick() => {
                    self.cycle.run_tick().await;
                }

                // Handle commands
                cmd = self.command_rx.recv() => {
                    // Every handle has been dropped
                    let Some(cmd) = cmd else {
                        warn!("command channel closed, shutting down");
                        break;
                    };

                    match cmd {
                        SchedulerCommand::CheckNow { respond_to } => {
                            debug!("received CheckNow command");
                            let summary = self.cycle.run_tick().await;
                            let _ = respond_to.send(summary);
                        }

                        SchedulerCommand::UpdateInterval { interval_secs } => {
                            if interval_secs == 0 {
                                warn!("ignoring zero tick interval");
                            } else {
                                debug!("updating interval to {interval_secs}s");
                                self.interval_duration = Duration::from_secs(interval_secs);
                                ticker = self.new_ticker();
                            }
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }
            }
        }

        info!("monitor loop stopped");
    }

    /// Missed ticks are delayed rather than bursted, keeping a full interval
    /// between the end of one tick and the start of the next
    fn new_ticker(&self) -> tokio::time::Interval {
        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}

/// Handle for controlling a ProbeSchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor
    pub fn spawn(cycle: ProbeCycle, interval_duration: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = ProbeSchedulerActor::new(cycle, cmd_rx, interval_duration);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a tick right now and wait for its summary
    pub async fn check_now(&self) -> Result<TickSummary> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::CheckNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Update the tick interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Stop the monitoring cycle
    pub async fn shutdown(self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }

    /// Whether the actor has exited
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ============================================================================
// Tests
// ============================================================================
