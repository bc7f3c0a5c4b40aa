//! Message types for actor communication
//!
//! Commands travel over an mpsc channel to a specific actor; answers come
//! back on a oneshot channel carried inside the command.

use tokio::sync::oneshot;

/// Commands that can be sent to the ProbeSchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run a full tick immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    CheckNow {
        /// Channel to send the tick summary back
        respond_to: oneshot::Sender<TickSummary>,
    },

    /// Update the tick interval
    ///
    /// The timer restarts with the new period.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the scheduler
    ///
    /// A tick that is already running completes first.
    Shutdown,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Targets probed in this tick
    pub probed: usize,

    /// Probes classified as up
    pub up: usize,

    /// Probes classified as down (including unexpected failures)
    pub down: usize,

    /// Outcomes discarded because the target was removed mid-tick
    pub discarded: usize,

    /// Listeners that received the post-tick snapshot
    pub notified: usize,
}
