//! Monitor configuration and API base URL resolution.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::models::Denomination;
use crate::polling::PollingConfig;

/// Local development backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Prefix the backend mounts its routes under when it serves the monitor's host.
pub const API_PREFIX: &str = "/api";

/// Resolved monitor configuration. Built once at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,

    /// Seconds between background refreshes
    pub poll_interval_secs: u64,

    /// Number of leaderboard rows to show
    pub leaderboard_size: usize,

    /// Which payload variant the backend serves
    pub denomination: Denomination,

    /// Refresh after a failed cycle trigger as well
    pub refresh_after_failed_cycle: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            poll_interval_secs: 10,
            leaderboard_size: 15,
            denomination: Denomination::Usd,
            refresh_after_failed_cycle: false,
        }
    }
}

impl MonitorConfig {
    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            refresh_after_failed_cycle: self.refresh_after_failed_cycle,
        }
    }
}

/// Pick the backend base URL.
///
/// An explicit value always wins. Otherwise, when the monitor knows the origin
/// it is served from and that origin is not a loopback host, the backend is
/// expected under the same origin. Everything else falls back to the local
/// development backend.
pub fn resolve_base_url(explicit: Option<&str>, origin: Option<&str>) -> Result<String> {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        Url::parse(url).with_context(|| format!("Invalid API URL: {}", url))?;
        return Ok(url.trim_end_matches('/').to_string());
    }

    if let Some(origin) = origin.map(str::trim).filter(|o| !o.is_empty()) {
        let parsed = Url::parse(origin).with_context(|| format!("Invalid origin: {}", origin))?;

        if let Some(host) = parsed.host_str() {
            if !is_loopback_host(host) {
                return Ok(format!("{}{}", parsed.origin().ascii_serialization(), API_PREFIX));
            }
        }
    }

    Ok(DEFAULT_API_URL.to_string())
}

/// `localhost`, 127.0.0.0/8 or ::1.
pub fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
