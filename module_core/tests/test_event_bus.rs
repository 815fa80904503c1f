use common::position::GnssFix;
use common::request::RequestOutcome;
use module_core::test_helper::wait_for_event;
use module_core::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
#[test_log::test]
pub async fn events_delivered() {
    let event_bus = EventBus::new();
    let mut receiver = event_bus.subscribe();
    let event = Event {
        kind: EventKind::QuitEvent,
    };
    event_bus.publish(&event);
    let received_event = tokio::time::timeout(Duration::from_millis(100), receiver.recv())
        .await
        .expect("Failed to receive event in required time")
        .unwrap();
    assert_eq!(received_event.event_type(), event.event_type());
}

#[tokio::test]
#[test_log::test]
pub async fn test_wait_for_event_skips_other_events() {
    let event_bus = EventBus::new();
    let ctx = event_bus.context();
    let mut receiver = event_bus.subscribe();

    ctx.publish_event(EventKind::LocationRequestEvent(RequestOutcome::Disconnected))
        .unwrap();
    ctx.publish_event(EventKind::GnssFixEvent(Arc::new(GnssFix::new(
        52.0, 11.0, 80.0, 3.0, 7,
    ))))
    .unwrap();

    let event = wait_for_event(
        &mut receiver,
        Duration::from_millis(100),
        EventKindType::GnssFixEvent,
    )
    .await;
    let fix = payload_ref!(event.kind, EventKind::GnssFixEvent).unwrap();
    assert_eq!(fix.latitude, 52.0);
    assert_eq!(fix.satellites, 7);
}

#[tokio::test]
#[test_log::test]
pub async fn location_request_event_carries_the_outcome() {
    let event_bus = EventBus::new();
    let ctx = event_bus.context();
    let mut receiver = event_bus.subscribe();

    ctx.publish_event(EventKind::LocationRequestEvent(RequestOutcome::Published {
        observations: 3,
    }))
    .unwrap();

    let event = wait_for_event(
        &mut receiver,
        Duration::from_millis(100),
        EventKindType::LocationRequestEvent,
    )
    .await;
    assert_eq!(
        payload_ref!(event.kind, EventKind::LocationRequestEvent),
        Some(&RequestOutcome::Published { observations: 3 })
    );
}

#[test]
pub fn publish_without_subscriber_is_an_error() {
    let event_bus = EventBus::new();
    let ctx = event_bus.context();
    let ModuleCtx { sender, receiver } = ctx;
    drop(receiver);
    assert!(
        sender
            .send(Event {
                kind: EventKind::QuitEvent
            })
            .is_err()
    );
}

#[test]
pub fn payload_ref_returns_none_for_other_variants() {
    let kind = EventKind::RequestLocationEvent;
    assert!(payload_ref!(kind, EventKind::PositionUpdatedEvent).is_none());
    assert_eq!(EventKindType::from(&kind), EventKindType::RequestLocationEvent);
}
