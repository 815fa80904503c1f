// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::position::{Coordinate, Position, PositionSource};
use common::time_source::TimeSource;
use locator::transport::{Transport, Visibility};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Body of a beacon event.
#[derive(Debug, Serialize)]
struct BeaconPayload {
    latitude: f64,
    longitude: f64,
    altitude: f64,
    speed: f64,
    satellites: i32,
    source: PositionSource,
    accuracy: Option<f64>,
}

impl From<&Position> for BeaconPayload {
    fn from(position: &Position) -> Self {
        BeaconPayload {
            latitude: position.latitude(),
            longitude: position.longitude(),
            altitude: position.altitude(),
            speed: position.speed(),
            satellites: position.satellites(),
            source: position.source(),
            accuracy: position.accuracy(),
        }
    }
}

/// Publishes the authoritative position at most once per interval, and only
/// if it moved since the last beacon.
pub struct PositionBeacon<T: TimeSource> {
    time_source: T,
    interval: Duration,
    event_name: String,
    last_check_us: Option<u64>,
    last_published: Option<Coordinate>,
}

impl<T: TimeSource> PositionBeacon<T> {
    pub fn new(event_name: &str, interval: Duration, time_source: T) -> Self {
        PositionBeacon {
            time_source,
            interval,
            event_name: event_name.to_string(),
            last_check_us: None,
            last_published: None,
        }
    }

    /// Returns `true` if `position` was published.
    pub fn tick(&mut self, transport: &mut dyn Transport, position: &Position) -> bool {
        let now = self.time_source.now_us();
        let interval = u64::try_from(self.interval.as_micros()).unwrap_or(u64::MAX);
        if self
            .last_check_us
            .is_some_and(|at| now.saturating_sub(at) < interval)
        {
            return false;
        }
        self.last_check_us = Some(now);

        let coordinate = position.coordinate();
        if position.is_unset()
            || self.last_published == Some(coordinate)
            || !transport.is_connected()
        {
            return false;
        }
        let payload = match serde_json::to_string(&BeaconPayload::from(position)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize beacon. Error: {e}");
                return false;
            }
        };
        if !transport.publish(&self.event_name, &payload, Visibility::Private) {
            warn!("Failed to publish beacon");
            return false;
        }
        debug!("Beacon published {payload}");
        self.last_published = Some(coordinate);
        true
    }
}
