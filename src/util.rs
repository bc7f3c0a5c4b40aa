use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, bail};
use reqwest::Url;

const MONITOR_PORT: &str = "MONITOR_PORT";

const DEFAULT_PORT: u16 = 8000;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(MONITOR_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const MONITOR_ADDR: &str = "MONITOR_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> IpAddr {
    let addr_from_env = std::env::var(MONITOR_ADDR);
    addr_from_env.map_or(IpAddr::V4(DEFAULT_ADDR), |res| {
        res.parse().unwrap_or(IpAddr::V4(DEFAULT_ADDR))
    })
}

/// Bind address from `MONITOR_ADDR` / `MONITOR_PORT`
pub fn get_bind_addr() -> SocketAddr {
    SocketAddr::new(get_addr(), get_port())
}

/// Parse and normalize a target URL
///
/// Only absolute http(s) URLs with a host are accepted. Every entry path
/// (config seeds and REST input) registers the normalized form, so
/// `http://example.com` and `http://example.com/` name the same target.
pub fn normalize_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid url '{raw}'"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported url scheme '{}'", url.scheme());
    }

    if url.host_str().is_none() {
        bail!("url '{raw}' has no host");
    }

    Ok(url.to_string())
}
