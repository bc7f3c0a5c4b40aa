//! HTTP(S) prober backed by reqwest

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, instrument, trace, warn};

use super::{ProbeOutcome, Prober};

/// Default probe timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Maximum number of redirects followed per probe
const MAX_REDIRECTS: usize = 10;

/// Issues a GET against each target, following redirects
///
/// The client is built once and shared by every probe, so connection pools
/// survive across ticks.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Build a prober whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> ProbeOutcome {
        trace!("probing {url}");

        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(url, &e),
        };

        let status_code = response.status().as_u16();

        // The body is part of the measured transfer
        if let Err(e) = response.bytes().await {
            return classify_error(url, &e);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        trace!("{url} answered {status_code} in {elapsed_ms}ms");

        ProbeOutcome::Responded {
            status_code,
            elapsed_ms,
        }
    }
}

/// Split reqwest failures into network trouble and everything else
///
/// Builder errors (an unparsable URL, an unsupported scheme) never reach the
/// network, so they are reported as unexpected failures rather than an
/// unreachable target.
fn classify_error(url: &str, e: &reqwest::Error) -> ProbeOutcome {
    if e.is_builder() {
        error!("unexpected error checking {url}: {e}");
        return ProbeOutcome::Failed {
            reason: e.to_string(),
        };
    }

    let reason = if e.is_timeout() {
        format!("timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else if e.is_redirect() {
        format!("redirect loop: {e}")
    } else {
        e.to_string()
    };

    warn!("error checking {url}: {reason}");
    ProbeOutcome::Unreachable { reason }
}
