//! Per-target state and its computed snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ring::RingBuffer;
use crate::monitors::{ProbeOutcome, STATUS_UNKNOWN};

/// Number of latency samples kept per target
pub const RESPONSE_TIME_CAPACITY: usize = 100;

/// Number of status changes kept per target
pub const STATUS_HISTORY_CAPACITY: usize = 50;

/// Number of status changes exposed in a snapshot
pub const STATUS_HISTORY_EXPOSED: usize = 10;

/// A recorded transition in a target's status or up/down state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub timestamp: DateTime<Utc>,
    pub old_status: String,
    pub new_status: String,
}

/// One monitored endpoint and everything accumulated about it
///
/// Fields are private: the only mutation path after creation is
/// [`Target::record`], which keeps `status` and `is_up` in lockstep.
#[derive(Debug, Clone)]
pub struct Target {
    url: String,
    status: String,
    is_up: bool,
    response_time: u64,
    last_checked: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    total_checks: u64,
    successful_checks: u64,
    response_times: RingBuffer<u64>,
    status_history: RingBuffer<StatusChange>,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_created_at(url, Utc::now())
    }

    pub fn with_created_at(url: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            status: STATUS_UNKNOWN.to_string(),
            is_up: false,
            response_time: 0,
            last_checked: None,
            created_at,
            total_checks: 0,
            successful_checks: 0,
            response_times: RingBuffer::with_capacity(RESPONSE_TIME_CAPACITY),
            status_history: RingBuffer::with_capacity(STATUS_HISTORY_CAPACITY),
        }
    }

    /// Apply one probe outcome observed at `at`
    ///
    /// Returns the status change if one was recorded.
    pub fn record(&mut self, outcome: &ProbeOutcome, at: DateTime<Utc>) -> Option<StatusChange> {
        let status = outcome.status_line();
        let is_up = outcome.is_up();
        let response_time = outcome.response_time_ms();

        let change = (status != self.status || is_up != self.is_up).then(|| StatusChange {
            timestamp: at,
            old_status: self.status.clone(),
            new_status: status.clone(),
        });

        self.status = status;
        self.is_up = is_up;
        self.response_time = response_time;
        self.last_checked = Some(at);

        self.total_checks += 1;
        if is_up {
            self.successful_checks += 1;
        }

        // Non-2xx/3xx answers still carry a latency sample
        if response_time > 0 {
            self.response_times.push(response_time);
        }

        if let Some(change) = &change {
            self.status_history.push(change.clone());
        }

        change
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_up(&self) -> bool {
        self.is_up
    }

    pub fn total_checks(&self) -> u64 {
        self.total_checks
    }

    pub fn successful_checks(&self) -> u64 {
        self.successful_checks
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn response_times(&self) -> &RingBuffer<u64> {
        &self.response_times
    }

    pub fn status_history(&self) -> &RingBuffer<StatusChange> {
        &self.status_history
    }

    /// Percentage of successful checks, rounded to two decimals
    pub fn uptime_percentage(&self) -> f64 {
        if self.total_checks == 0 {
            return 0.0;
        }
        let ratio = self.successful_checks as f64 / self.total_checks as f64 * 100.0;
        (ratio * 100.0).round() / 100.0
    }

    /// Integer mean of the stored latency samples
    pub fn avg_response_time(&self) -> u64 {
        if self.response_times.is_empty() {
            return 0;
        }
        let sum: u64 = self.response_times.iter().sum();
        sum / self.response_times.len() as u64
    }

    pub fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            url: self.url.clone(),
            status: self.status.clone(),
            is_up: self.is_up,
            response_time: self.response_time,
            last_checked: self.last_checked,
            uptime_percentage: self.uptime_percentage(),
            total_checks: self.total_checks,
            successful_checks: self.successful_checks,
            avg_response_time: self.avg_response_time(),
            status_history: self
                .status_history
                .latest(STATUS_HISTORY_EXPOSED)
                .cloned()
                .collect(),
            created_at: self.created_at,
        }
    }
}

/// Read-only view of a target with every derived field computed
///
/// This is the wire shape pushed to dashboards and returned by the REST
/// listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub url: String,
    pub status: String,
    pub is_up: bool,
    pub response_time: u64,
    pub last_checked: Option<DateTime<Utc>>,
    pub uptime_percentage: f64,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub avg_response_time: u64,
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
}
