// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::haversine;
use common::position::{GnssFix, Position, PositionSource};
use common::time_source::{MonotonicTimeSource, TimeSource};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a GPS fix keeps network fixes out.
pub const DEFAULT_DRIFT_WINDOW: Duration = Duration::from_micros(45_000_000);

/// The decision taken for an offered fix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arbitration {
    /// The fix is the new authoritative position.
    Accepted(PositionSource),
    /// The GPS fix was not valid or not updated.
    Ignored,
    /// A GPS fix was accepted `gps_age` ago, within the drift window.
    RejectedRecentGps { gps_age: Duration },
    /// The network fix is exactly 0,0, which is never a real answer.
    RejectedZeroCoordinates,
}

impl Arbitration {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Arbitration::Accepted(_))
    }
}

/// Keeps the authoritative position of the tracker.
///
/// GPS fixes always win. A network fix only replaces the position if nothing
/// is known yet or the last GPS fix is older than the drift window.
///
/// # Type Parameters
/// - `T`: The time source, defaults to [`MonotonicTimeSource`].
pub struct PositionArbiter<T: TimeSource = MonotonicTimeSource> {
    time_source: T,
    drift_window: Duration,
    current: Position,
    previous: Position,
    /// Written only when a GPS fix is accepted.
    last_gps_fix_us: Option<u64>,
}

impl PositionArbiter<MonotonicTimeSource> {
    pub fn new(drift_window: Duration) -> Self {
        PositionArbiter::new_with_source(drift_window, MonotonicTimeSource::default())
    }
}

impl Default for PositionArbiter<MonotonicTimeSource> {
    fn default() -> Self {
        Self::new(DEFAULT_DRIFT_WINDOW)
    }
}

impl<T: TimeSource> PositionArbiter<T> {
    pub fn new_with_source(drift_window: Duration, time_source: T) -> Self {
        PositionArbiter {
            time_source,
            drift_window,
            current: Position::unset(),
            previous: Position::unset(),
            last_gps_fix_us: None,
        }
    }

    /// Offers a fix from the GPS receiver.
    ///
    /// Only fixes that are valid and updated are taken.
    pub fn update_gps_fix(&mut self, fix: &GnssFix) -> Arbitration {
        if !fix.is_new() {
            return Arbitration::Ignored;
        }
        let now = self.time_source.now_us();
        self.replace(Position::from_gnss_fix(fix, now));
        self.last_gps_fix_us = Some(now);
        Arbitration::Accepted(PositionSource::Gps)
    }

    /// Offers a position answered by the geolocation service.
    ///
    /// A 0,0 fix is always rejected, it would make the position unset again.
    pub fn update_network_fix(
        &mut self,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
    ) -> Arbitration {
        if latitude == 0.0 && longitude == 0.0 {
            warn!("Network fix 0,0 rejected");
            return Arbitration::RejectedZeroCoordinates;
        }
        if let Some(gps_age) = self.last_gps_fix_age()
            && !self.current.is_unset()
            && gps_age <= self.drift_window
        {
            info!(
                "Network fix {latitude},{longitude} rejected, GPS fix is {} ms old",
                gps_age.as_millis()
            );
            return Arbitration::RejectedRecentGps { gps_age };
        }
        let now = self.time_source.now_us();
        let position = Position::from_network(latitude, longitude, accuracy, &self.current, now);
        self.replace(position);
        info!("Network fix {latitude},{longitude} accepted, accuracy {accuracy} m");
        Arbitration::Accepted(PositionSource::Network)
    }

    fn replace(&mut self, position: Position) {
        debug!("Position {} -> {}", self.current, position);
        self.previous = self.current;
        self.current = position;
    }

    pub fn current_position(&self) -> &Position {
        &self.current
    }

    pub fn provenance(&self) -> PositionSource {
        self.current.source()
    }

    /// The position the current one replaced.
    pub fn previous_position(&self) -> &Position {
        &self.previous
    }

    /// `true` if latitude or longitude differ from the previous position.
    pub fn has_moved(&self) -> bool {
        self.current.latitude() != self.previous.latitude()
            || self.current.longitude() != self.previous.longitude()
    }

    /// Distance in meters between the previous and the current position.
    pub fn distance_moved(&self) -> f64 {
        haversine(
            self.previous.latitude(),
            self.previous.longitude(),
            self.current.latitude(),
            self.current.longitude(),
        )
    }

    /// Time since the last accepted GPS fix, `None` if there was none.
    pub fn last_gps_fix_age(&self) -> Option<Duration> {
        self.last_gps_fix_us
            .map(|at| Duration::from_micros(self.time_source.elapsed_since(at)))
    }

    pub fn drift_window(&self) -> Duration {
        self.drift_window
    }
}
