//! Endpoint probing
//!
//! A probe issues one request against a target URL and reports a
//! [`ProbeOutcome`]. The scheduler only sees the [`Prober`] trait, which
//! keeps the HTTP client swappable in tests.

pub mod http;

use async_trait::async_trait;

pub use http::HttpProber;

/// Status string of a target that has never been probed
pub const STATUS_UNKNOWN: &str = "UNKNOWN";

/// Status string after a transport-level failure
pub const STATUS_DOWN: &str = "DOWN";

/// Status string after an unexpected probe failure
pub const STATUS_ERROR: &str = "ERROR";

/// Result of a single probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered with an HTTP status
    Responded {
        status_code: u16,
        /// Wall-clock latency of the request in milliseconds
        elapsed_ms: u64,
    },

    /// Timeout, refused connection, DNS or TLS failure
    Unreachable { reason: String },

    /// Anything that went wrong outside the network itself
    Failed { reason: String },
}

impl ProbeOutcome {
    /// Up iff the endpoint answered with a status in [200, 400)
    pub fn is_up(&self) -> bool {
        matches!(self, ProbeOutcome::Responded { status_code, .. } if (200..400).contains(status_code))
    }

    /// Human-readable status line recorded on the target
    pub fn status_line(&self) -> String {
        match self {
            ProbeOutcome::Responded { status_code, .. } if self.is_up() => {
                format!("{status_code} OK")
            }
            ProbeOutcome::Responded { status_code, .. } => format!("HTTP {status_code}"),
            ProbeOutcome::Unreachable { .. } => STATUS_DOWN.to_string(),
            ProbeOutcome::Failed { .. } => STATUS_ERROR.to_string(),
        }
    }

    /// Latency to record; zero when no response was received
    pub fn response_time_ms(&self) -> u64 {
        match self {
            ProbeOutcome::Responded { elapsed_ms, .. } => *elapsed_ms,
            _ => 0,
        }
    }
}

/// Capability to probe a URL
///
/// Implementations must never panic or hang on a bad target: every failure
/// is folded into the returned outcome.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}
