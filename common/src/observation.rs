// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Wireless observations collected by a scan.
//!
//! An observation is a single nearby emitter, either a Wi-Fi access point or
//! a cell tower. Scans routinely contain entries with unknown fields, those
//! are reported as invalid and never leave the device.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Sentinel the modem reports for an unknown 16 bit cell field.
const UNKNOWN_CELL_FIELD: u16 = u16::MAX;

/// A 6 byte hardware address (BSSID).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// `true` for the all-zero and the broadcast address, which no real
    /// access point reports.
    pub fn is_unknown(&self) -> bool {
        self.0 == [0; 6] || self.0 == [0xff; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid MAC address '{0}'")]
pub struct MacAddressParseError(pub String);

impl FromStr for MacAddress {
    type Err = MacAddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(':');
        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| MacAddressParseError(s.to_string()))?;
            if part.len() != 2 {
                return Err(MacAddressParseError(s.to_string()));
            }
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| MacAddressParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(MacAddressParseError(s.to_string()));
        }
        Ok(MacAddress(bytes))
    }
}

/// A Wi-Fi access point seen during a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiAccessPoint {
    pub bssid: MacAddress,
    /// RSSI in dBm.
    pub signal_strength: i32,
    pub channel: i32,
}

/// A cell tower seen during a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTower {
    pub cell_id: u32,
    pub location_area_code: u32,
    pub mobile_country_code: u16,
    pub mobile_network_code: u16,
}

/// A single nearby wireless emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WirelessObservation {
    Wifi(WifiAccessPoint),
    Cell(CellTower),
}

impl WirelessObservation {
    /// Convenience constructor for a Wi-Fi observation.
    pub fn wifi(bssid: [u8; 6], signal_strength: i32, channel: i32) -> Self {
        WirelessObservation::Wifi(WifiAccessPoint {
            bssid: MacAddress(bssid),
            signal_strength,
            channel,
        })
    }

    /// Convenience constructor for a cell tower observation.
    pub fn cell(
        cell_id: u32,
        location_area_code: u32,
        mobile_country_code: u16,
        mobile_network_code: u16,
    ) -> Self {
        WirelessObservation::Cell(CellTower {
            cell_id,
            location_area_code,
            mobile_country_code,
            mobile_network_code,
        })
    }

    /// Returns `false` if a required field carries an "unknown" sentinel.
    pub fn is_valid(&self) -> bool {
        match self {
            WirelessObservation::Wifi(ap) => !ap.bssid.is_unknown(),
            WirelessObservation::Cell(tower) => {
                tower.location_area_code != 0
                    && tower.location_area_code != u32::from(UNKNOWN_CELL_FIELD)
                    && tower.mobile_country_code != UNKNOWN_CELL_FIELD
                    && tower.mobile_network_code != UNKNOWN_CELL_FIELD
            }
        }
    }
}

/// The leading part of an encoded scan.
///
/// The variant is fixed by the scanner configuration, Wi-Fi on a Wi-Fi
/// device and cellular on a cellular one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanHeader {
    /// `consider_ip` asks the geolocation service to also use the public IP.
    Wifi { consider_ip: bool },
    /// `operator` is the name of the registered network operator.
    Cellular { operator: String },
}

impl ScanHeader {
    /// `true` if `observation` belongs into a scan with this header.
    pub fn accepts(&self, observation: &WirelessObservation) -> bool {
        matches!(
            (self, observation),
            (ScanHeader::Wifi { .. }, WirelessObservation::Wifi(_))
                | (ScanHeader::Cellular { .. }, WirelessObservation::Cell(_))
        )
    }
}
