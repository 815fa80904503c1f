// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use locator::requester::Mode;
use locator::transport::Visibility;
use std::time::Duration;
use tracker::config::{ConfigError, ModeConfig, TrackerConfig};

#[test]
fn empty_config_uses_defaults() {
    let config = TrackerConfig::from_json("{}").unwrap();

    assert_eq!(config, TrackerConfig::default());
    assert_eq!(config.tick_interval(), Duration::from_millis(250));
    assert_eq!(config.mode, ModeConfig::Periodic { period_secs: 120 });
    assert_eq!(config.drift_window(), Duration::from_secs(45));
    assert_eq!(config.beacon_interval(), Duration::from_secs(5));
    assert_eq!(config.beacon_event_name, "deviceLocation_gps");

    let requester = config.requester_config();
    assert_eq!(requester.mode, Mode::Periodic(Duration::from_secs(120)));
    assert_eq!(requester.settle_delay, Duration::from_millis(8000));
    assert_eq!(requester.event_name, "deviceLocator");
    assert_eq!(requester.visibility, Visibility::Private);
    assert_eq!(requester.device_id, None);
}

#[test]
fn parse_full_config() {
    let json = r#"{
        "tick_interval_ms": 100,
        "mode": { "type": "once" },
        "settle_delay_ms": 2000,
        "drift_window_us": 10000000,
        "event_name": "deviceLocation_cell",
        "public_event": true,
        "device_id": "e00fce68",
        "beacon_event_name": "beacon",
        "beacon_interval_ms": 1000
    }"#;

    let config = TrackerConfig::from_json(json).unwrap();

    assert_eq!(config.tick_interval(), Duration::from_millis(100));
    assert_eq!(config.mode, ModeConfig::Once);
    assert_eq!(config.drift_window(), Duration::from_secs(10));
    assert_eq!(config.beacon_event_name, "beacon");
    let requester = config.requester_config();
    assert_eq!(requester.mode, Mode::Once);
    assert_eq!(requester.settle_delay, Duration::from_secs(2));
    assert_eq!(requester.visibility, Visibility::Public);
    assert_eq!(
        requester.reply_topic(),
        "hook-response/deviceLocation_cell/e00fce68"
    );
}

#[test]
fn parse_modes() {
    let manual = TrackerConfig::from_json(r#"{"mode": {"type": "manual"}}"#).unwrap();
    assert_eq!(manual.mode, ModeConfig::Manual);

    let periodic =
        TrackerConfig::from_json(r#"{"mode": {"type": "periodic", "period_secs": 30}}"#).unwrap();
    assert_eq!(
        Mode::from(periodic.mode),
        Mode::Periodic(Duration::from_secs(30))
    );
}

#[test]
fn invalid_config_is_an_error() {
    let result = TrackerConfig::from_json(r#"{"mode": {"type": "sometimes"}}"#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));

    let result = TrackerConfig::from_json(r#"{"tick_interval_ms": "fast"}"#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn zero_tick_interval_is_rejected() {
    let result = TrackerConfig::from_json(r#"{"tick_interval_ms": 0}"#);

    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            field: "tick_interval_ms",
            ..
        })
    ));
}

#[test]
fn zero_tick_interval_in_a_file_is_rejected() {
    let path = std::env::temp_dir().join(format!(
        "fleet-tracker-test-zero-tick-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, r#"{"tick_interval_ms": 0}"#).unwrap();

    let result = TrackerConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn tick_interval_is_never_zero() {
    let config = TrackerConfig {
        tick_interval_ms: 0,
        ..Default::default()
    };

    assert_eq!(config.tick_interval(), Duration::from_millis(1));
}

#[test]
fn missing_file_uses_defaults() {
    let path = std::env::temp_dir().join("fleet-tracker-test-does-not-exist.json");

    let config = TrackerConfig::load(&path).unwrap();

    assert_eq!(config, TrackerConfig::default());
}

#[test]
fn load_config_file() {
    let path = std::env::temp_dir().join(format!("fleet-tracker-test-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"device_id": "abc"}"#).unwrap();

    let config = TrackerConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.unwrap().device_id.as_deref(), Some("abc"));
}
