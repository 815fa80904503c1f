// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate with latitude and longitude.
///
/// The `Coordinate` struct is used to store a point on Earth in decimal
/// degrees, e.g. the points of a replayed route. Latitude values range from
/// -90.0 to 90.0, and longitude values range from -180.0 to 180.0.
///
/// # Example
///
/// ```rust
/// use common::position::Coordinate;
///
/// let coordinate = Coordinate {
///     latitude: 52.5200,
///     longitude: 13.4050,
/// };
///
/// println!("{:?}", coordinate);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new [`Coordinate`] with the given latitude and longitude.
    ///
    /// # Example
    ///
    /// ```rust
    /// use common::position::Coordinate;
    ///
    /// let coordinate = Coordinate::new(52.5200, 13.4050);
    /// assert_eq!(coordinate.latitude, 52.5200);
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A single decoded reading delivered by the GPS collaborator.
///
/// Sentence decoding happens upstream; this is the already decoded result of
/// one poll. Only fixes that are both `valid` and `updated` count as a new
/// fix, see [`GnssFix::is_new`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GnssFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Speed over ground in meters per second.
    pub speed: f64,
    pub satellites: i32,
    pub valid: bool,
    pub updated: bool,
    #[serde(default)]
    pub utc: Option<DateTime<Utc>>,
}

impl GnssFix {
    /// Creates a valid and updated [`GnssFix`] without an UTC timestamp.
    ///
    /// # Example
    ///
    /// ```rust
    /// use common::position::GnssFix;
    ///
    /// let fix = GnssFix::new(52.0, 13.0, 35.0, 15.5, 8);
    /// assert!(fix.is_new());
    /// ```
    pub fn new(latitude: f64, longitude: f64, altitude: f64, speed: f64, satellites: i32) -> Self {
        GnssFix {
            latitude,
            longitude,
            altitude,
            speed,
            satellites,
            valid: true,
            updated: true,
            utc: None,
        }
    }

    /// Attaches the UTC time reported by the receiver.
    pub fn with_utc(mut self, utc: DateTime<Utc>) -> Self {
        self.utc = Some(utc);
        self
    }

    /// Marks the fix as not valid, e.g. the receiver has no satellite lock.
    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Marks the fix as a repetition of the previously delivered reading.
    pub fn stale(mut self) -> Self {
        self.updated = false;
        self
    }

    /// `true` if the fix is valid and was updated since the last poll.
    pub fn is_new(&self) -> bool {
        self.valid && self.updated
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// The provenance of a [`Position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
    /// The position was taken from the GPS receiver.
    Gps,
    /// The position was derived from nearby Wi-Fi access points or cell towers.
    Network,
}

impl PositionSource {
    /// The one letter tag shown next to the coordinates on the status line.
    pub fn tag(&self) -> char {
        match self {
            PositionSource::Gps => 'g',
            PositionSource::Network => 'c',
        }
    }
}

/// The authoritative position of the tracker.
///
/// A `Position` is immutable once constructed. It is created for every
/// accepted fix and kept until a newer fix supersedes it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    altitude: f64,
    speed: f64,
    satellites: i32,
    captured_at_us: u64,
    source: PositionSource,
    accuracy: Option<f64>,
}

impl Position {
    /// The bootstrap position before any fix has been accepted.
    ///
    /// All values are zero and the provenance is [`PositionSource::Network`],
    /// because nothing has been received from the GPS yet.
    pub fn unset() -> Self {
        Position {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            speed: 0.0,
            satellites: 0,
            captured_at_us: 0,
            source: PositionSource::Network,
            accuracy: None,
        }
    }

    /// Creates a GPS sourced position from a decoded fix.
    pub fn from_gnss_fix(fix: &GnssFix, captured_at_us: u64) -> Self {
        Position {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            speed: fix.speed,
            satellites: fix.satellites,
            captured_at_us,
            source: PositionSource::Gps,
            accuracy: None,
        }
    }

    /// Creates a network sourced position.
    ///
    /// Network geolocation only reports latitude, longitude and accuracy, the
    /// remaining values are carried over from `last`.
    pub fn from_network(
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        last: &Position,
        captured_at_us: u64,
    ) -> Self {
        Position {
            latitude,
            longitude,
            altitude: last.altitude,
            speed: last.speed,
            satellites: last.satellites,
            captured_at_us,
            source: PositionSource::Network,
            accuracy: Some(accuracy),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude in meters.
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    /// Speed in meters per second.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn satellites(&self) -> i32 {
        self.satellites
    }

    /// Monotonic capture time in microseconds.
    pub fn captured_at_us(&self) -> u64 {
        self.captured_at_us
    }

    pub fn source(&self) -> PositionSource {
        self.source
    }

    /// Accuracy radius in meters, only reported for network positions.
    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    /// `true` while latitude and longitude are both exactly zero.
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::unset()
    }
}

/// Renders the status line, longitude first: `11.279,52.026(g)`.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3},{:.3}({})",
            self.longitude,
            self.latitude,
            self.source.tag()
        )
    }
}
