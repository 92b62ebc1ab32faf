//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unset or unparsable values fall back
//! to the defaults documented on each field.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::RelayError;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (default `0.0.0.0:3001`).
    pub listen_addr: SocketAddr,

    /// Origin allowed by CORS. `None` allows any origin.
    pub dashboard_origin: Option<String>,

    /// Room that receives `driver-position` events (default `dashboard`).
    pub dashboard_room: String,

    /// Per-connection outbound queue bound (default 256).
    pub outbound_queue_capacity: usize,

    /// How long a long-poll `GET` waits for the first frame (default 25s).
    pub poll_wait: Duration,

    /// Maximum frames returned by one long-poll response (default 64).
    pub poll_batch_max: usize,

    /// Polling sessions idle longer than this are disconnected
    /// (default 60s).
    pub poll_idle_timeout: Duration,

    /// How often the idle-session sweeper runs (default 15s).
    pub poll_sweep_interval: Duration,

    /// Timeout applied to HTTP requests (default 60s). Kept above
    /// `poll_wait` so long-polls are not cut short.
    pub request_timeout: Duration,

    /// Emit logs as JSON instead of human-readable text.
    pub log_json: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            dashboard_origin: None,
            dashboard_room: "dashboard".to_string(),
            outbound_queue_capacity: 256,
            poll_wait: Duration::from_secs(25),
            poll_batch_max: 64,
            poll_idle_timeout: Duration::from_secs(60),
            poll_sweep_interval: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
            log_json: false,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `LISTEN_ADDR` is set but cannot be
    /// parsed as a [`SocketAddr`], or if `DASHBOARD_ROOM` is set to an
    /// empty string.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| RelayError::Config(format!("LISTEN_ADDR {raw:?}: {e}")))?,
            Err(_) => defaults.listen_addr,
        };

        let dashboard_origin = std::env::var("DASHBOARD_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let dashboard_room = match std::env::var("DASHBOARD_ROOM") {
            Ok(room) if room.trim().is_empty() => {
                return Err(RelayError::Config("DASHBOARD_ROOM must not be empty".to_string()));
            }
            Ok(room) => room,
            Err(_) => defaults.dashboard_room,
        };

        let poll_wait = parse_secs("POLL_WAIT_SECS", defaults.poll_wait);
        let request_timeout = parse_secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout)
            .max(poll_wait + Duration::from_secs(5));

        Ok(Self {
            listen_addr,
            dashboard_origin,
            dashboard_room,
            outbound_queue_capacity: parse_env(
                "OUTBOUND_QUEUE_CAPACITY",
                defaults.outbound_queue_capacity,
            ),
            poll_wait,
            poll_batch_max: parse_env("POLL_BATCH_MAX", defaults.poll_batch_max),
            poll_idle_timeout: parse_secs("POLL_IDLE_TIMEOUT_SECS", defaults.poll_idle_timeout),
            poll_sweep_interval: parse_secs(
                "POLL_SWEEP_INTERVAL_SECS",
                defaults.poll_sweep_interval,
            ),
            request_timeout,
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a whole number of seconds. Zero is treated as invalid.
fn parse_secs(key: &str, default: Duration) -> Duration {
    match parse_env::<u64>(key, 0) {
        0 => default,
        secs => Duration::from_secs(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.listen_addr.port(), 3001);
        assert_eq!(config.dashboard_room, "dashboard");
        assert_eq!(config.outbound_queue_capacity, 256);
        assert!(config.request_timeout > config.poll_wait);
        assert!(config.dashboard_origin.is_none());
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: usize = parse_env("SNOWFLEET_RELAY_TEST_UNSET_KEY", 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn parse_secs_falls_back_on_missing_key() {
        let value = parse_secs("SNOWFLEET_RELAY_TEST_UNSET_SECS", Duration::from_secs(9));
        assert_eq!(value, Duration::from_secs(9));
    }
}
