// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::observation::WirelessObservation;
use common::position::{GnssFix, PositionSource};
use locator::requester::RequestOutcome;
use locator::test_helper::recording_transport::RecordingTransport;
use locator::test_helper::scripted_scanner::ScriptedScanner;
use module_core::{
    Event, EventBus, EventKind, EventKindType, Module, payload_ref,
    test_helper::{assert_no_event, stop_module, wait_for_event},
};
use std::sync::Arc;
use std::time::Duration;
use tracker::TrackerModule;
use tracker::config::{ModeConfig, TrackerConfig};

const TIMEOUT: Duration = Duration::from_millis(500);

fn config(mode: ModeConfig) -> TrackerConfig {
    TrackerConfig {
        tick_interval_ms: 10,
        mode,
        settle_delay_ms: 0,
        ..Default::default()
    }
}

fn start_module(
    event_bus: &EventBus,
    config: TrackerConfig,
    transport: RecordingTransport,
) -> tokio::task::JoinHandle<Result<(), ()>> {
    let scanner = ScriptedScanner::wifi(vec![WirelessObservation::wifi(
        [0xa4, 0x2b, 0xb0, 0x01, 0x02, 0x03],
        -58,
        11,
    )]);
    let mut module = TrackerModule::new(
        event_bus.context(),
        &config,
        Box::new(transport),
        Box::new(scanner),
    );
    tokio::spawn(async move { module.run().await })
}

#[test_log::test(tokio::test)]
async fn request_and_reply_update_the_position() {
    let event_bus = EventBus::default();
    let mut rx = event_bus.subscribe();
    let transport = RecordingTransport::connected();
    let mut module_handle = start_module(&event_bus, config(ModeConfig::Once), transport.clone());

    let event = wait_for_event(&mut rx, TIMEOUT, EventKindType::LocationRequestEvent).await;
    assert_eq!(
        payload_ref!(event.kind, EventKind::LocationRequestEvent),
        Some(&RequestOutcome::Published { observations: 1 })
    );
    assert_eq!(
        transport.published()[0].payload,
        r#"{"w":{"i":true,"a":[{"m":"a4:2b:b0:01:02:03","s":-58,"c":11}]}}"#
    );

    transport.reply("48.8566,2.3522,20.0");
    let event = wait_for_event(&mut rx, TIMEOUT, EventKindType::PositionUpdatedEvent).await;
    let position = payload_ref!(event.kind, EventKind::PositionUpdatedEvent).unwrap();
    assert_eq!(position.source(), PositionSource::Network);
    assert_eq!(position.latitude(), 48.8566);

    stop_module(&event_bus, &mut module_handle).await;
}

#[test_log::test(tokio::test)]
async fn gps_fix_event_updates_the_position() {
    let event_bus = EventBus::default();
    let mut rx = event_bus.subscribe();
    let mut module_handle = start_module(
        &event_bus,
        config(ModeConfig::Manual),
        RecordingTransport::default(),
    );

    event_bus.publish(&Event {
        kind: EventKind::GnssFixEvent(Arc::new(GnssFix::new(52.0, 11.0, 80.0, 3.0, 6))),
    });

    let event = wait_for_event(&mut rx, TIMEOUT, EventKindType::PositionUpdatedEvent).await;
    let position = payload_ref!(event.kind, EventKind::PositionUpdatedEvent).unwrap();
    assert_eq!(position.source(), PositionSource::Gps);
    assert_eq!((position.latitude(), position.longitude()), (52.0, 11.0));

    stop_module(&event_bus, &mut module_handle).await;
}

#[test_log::test(tokio::test)]
async fn manual_mode_requests_on_event_only() {
    let event_bus = EventBus::default();
    let mut rx = event_bus.subscribe();
    let transport = RecordingTransport::connected();
    let mut module_handle =
        start_module(&event_bus, config(ModeConfig::Manual), transport.clone());

    assert_no_event(
        &mut rx,
        Duration::from_millis(100),
        EventKindType::LocationRequestEvent,
    )
    .await;
    assert!(transport.published_as("deviceLocator").is_empty());

    event_bus.publish(&Event {
        kind: EventKind::RequestLocationEvent,
    });

    let event = wait_for_event(&mut rx, TIMEOUT, EventKindType::LocationRequestEvent).await;
    assert_eq!(
        payload_ref!(event.kind, EventKind::LocationRequestEvent),
        Some(&RequestOutcome::Published { observations: 1 })
    );
    assert_eq!(transport.published_as("deviceLocator").len(), 1);

    stop_module(&event_bus, &mut module_handle).await;
}
