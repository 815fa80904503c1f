// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Position algorithms of the tracker.

pub mod arbiter;

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great circle distance in meters between two points.
///
/// Uses the haversine formula on a spherical earth, which is accurate to
/// about 0.5% and stays well conditioned for very short distances.
///
/// # Parameters
/// - `lat1`, `lon1`: The first point in decimal degrees.
/// - `lat2`, `lon2`: The second point in decimal degrees.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests;
