//! HTTP(S) availability monitor
//!
//! Periodically probes registered endpoints, tracks per-target availability
//! and latency statistics, and pushes live snapshots to every connected
//! dashboard.

pub mod actors;
pub mod api;
pub mod config;
pub mod engine;
pub mod monitors;
pub mod notifier;
pub mod registry;
pub mod util;

pub use engine::{MonitorEngine, MonitorSettings};
pub use monitors::{ProbeOutcome, Prober};
pub use notifier::{DeliveryError, Listener, ListenerId, Notifier, NotifyReport};
pub use registry::{StatusChange, TargetRegistry, TargetSnapshot};
