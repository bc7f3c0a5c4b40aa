//! Actor-based monitoring cycle
//!
//! The scheduler runs as an independent async task controlled through a
//! handle, the same way every long-lived loop in this crate is driven.
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌──────────────────┐  commands  ┌─────────────────────┐
//!   │ SchedulerHandle  │ ─────────► │ ProbeSchedulerActor │
//!   └──────────────────┘            └──────────┬──────────┘
//!                                              │ every tick
//!                          ┌───────────────────┼───────────────────┐
//!                          ▼                   ▼                   ▼
//!                      probe(url)          probe(url)          probe(url)
//!                          └───────────────────┼───────────────────┘
//!                                              ▼
//!                                 TargetRegistry::record ×N
//!                                              ▼
//!                                    Notifier::notify_all
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for synchronous queries

pub mod messages;
pub mod scheduler;
