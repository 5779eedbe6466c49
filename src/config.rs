//! Server configuration parsed from environment variables.
//!
//! Every knob has a default except the idle-room TTL, whose absence disables
//! eviction. Parsing goes through a lookup function so tests can pass a map
//! instead of touching the process environment.

use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HUB_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;
/// Large enough for a full-canvas `eraseDrawing` or `undoRedo` payload.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 100_000_000;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_RATE_LIMIT_EVENTS: usize = 600;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hub_queue_capacity: usize,
    pub client_queue_capacity: usize,
    pub max_message_bytes: usize,
    /// `None` keeps rooms for the life of the process.
    pub room_idle_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    /// Zero disables the flood guard.
    pub rate_limit_events: usize,
    pub rate_limit_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            hub_queue_capacity: DEFAULT_HUB_QUEUE_CAPACITY,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            room_idle_ttl: None,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            rate_limit_events: DEFAULT_RATE_LIMIT_EVENTS,
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `HOST`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `HUB_QUEUE_CAPACITY`: default 1024
    /// - `CLIENT_QUEUE_CAPACITY`: default 256
    /// - `MAX_MESSAGE_BYTES`: default 100000000
    /// - `ROOM_IDLE_TTL_SECS`: unset (or 0) disables eviction
    /// - `ROOM_SWEEP_INTERVAL_SECS`: default 60
    /// - `RATE_LIMIT_EVENTS`: default 600, 0 disables
    /// - `RATE_LIMIT_WINDOW_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set but unparseable, or when a
    /// queue capacity or interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);

        let port = parse(&lookup, "PORT", defaults.port)?;
        let hub_queue_capacity = non_zero("HUB_QUEUE_CAPACITY", parse(&lookup, "HUB_QUEUE_CAPACITY", defaults.hub_queue_capacity)?)?;
        let client_queue_capacity =
            non_zero("CLIENT_QUEUE_CAPACITY", parse(&lookup, "CLIENT_QUEUE_CAPACITY", defaults.client_queue_capacity)?)?;
        let max_message_bytes = non_zero("MAX_MESSAGE_BYTES", parse(&lookup, "MAX_MESSAGE_BYTES", defaults.max_message_bytes)?)?;

        let room_idle_ttl = match parse(&lookup, "ROOM_IDLE_TTL_SECS", 0_u64)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let sweep_secs = non_zero(
            "ROOM_SWEEP_INTERVAL_SECS",
            parse(&lookup, "ROOM_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?,
        )?;

        let rate_limit_events = parse(&lookup, "RATE_LIMIT_EVENTS", defaults.rate_limit_events)?;
        let window_secs = non_zero(
            "RATE_LIMIT_WINDOW_SECS",
            parse(&lookup, "RATE_LIMIT_WINDOW_SECS", DEFAULT_RATE_LIMIT_WINDOW_SECS)?,
        )?;

        Ok(Self {
            host,
            port,
            hub_queue_capacity,
            client_queue_capacity,
            max_message_bytes,
            room_idle_ttl,
            sweep_interval: Duration::from_secs(sweep_secs),
            rate_limit_events,
            rate_limit_window: Duration::from_secs(window_secs),
        })
    }

    /// `host:port` for `TcpListener::bind`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

fn non_zero<T>(var: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        return Err(ConfigError::Zero { var });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
