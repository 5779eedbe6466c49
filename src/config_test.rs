use std::collections::HashMap;

use super::*;

fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    ServerConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn empty_environment_uses_defaults() {
    let cfg = config_from(&[]).unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
    assert_eq!(cfg.room_idle_ttl, None);
    assert_eq!(cfg.rate_limit_events, DEFAULT_RATE_LIMIT_EVENTS);
}

#[test]
fn overrides_are_applied() {
    let cfg = config_from(&[
        ("HOST", "127.0.0.1"),
        ("PORT", "8080"),
        ("HUB_QUEUE_CAPACITY", "16"),
        ("CLIENT_QUEUE_CAPACITY", "8"),
        ("MAX_MESSAGE_BYTES", "4096"),
        ("ROOM_IDLE_TTL_SECS", "300"),
        ("ROOM_SWEEP_INTERVAL_SECS", "5"),
        ("RATE_LIMIT_EVENTS", "0"),
        ("RATE_LIMIT_WINDOW_SECS", "2"),
    ])
    .unwrap();

    assert_eq!(cfg.bind_addr(), "127.0.0.1:8080");
    assert_eq!(cfg.hub_queue_capacity, 16);
    assert_eq!(cfg.client_queue_capacity, 8);
    assert_eq!(cfg.max_message_bytes, 4096);
    assert_eq!(cfg.room_idle_ttl, Some(Duration::from_secs(300)));
    assert_eq!(cfg.sweep_interval, Duration::from_secs(5));
    assert_eq!(cfg.rate_limit_events, 0);
    assert_eq!(cfg.rate_limit_window, Duration::from_secs(2));
}

#[test]
fn invalid_port_is_an_error() {
    assert_eq!(
        config_from(&[("PORT", "not-a-port")]),
        Err(ConfigError::Invalid { var: "PORT", value: "not-a-port".into() })
    );
    assert!(config_from(&[("PORT", "70000")]).is_err());
}

#[test]
fn zero_ttl_disables_eviction() {
    let cfg = config_from(&[("ROOM_IDLE_TTL_SECS", "0")]).unwrap();
    assert_eq!(cfg.room_idle_ttl, None);
}

#[test]
fn zero_queue_capacity_is_rejected() {
    assert_eq!(
        config_from(&[("CLIENT_QUEUE_CAPACITY", "0")]),
        Err(ConfigError::Zero { var: "CLIENT_QUEUE_CAPACITY" })
    );
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let cfg = config_from(&[("HOST", "  "), ("PORT", "")]).unwrap();
    assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
}
