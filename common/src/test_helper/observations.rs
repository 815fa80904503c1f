use crate::observation::WirelessObservation;

/// Returns `count` distinct, valid Wi-Fi observations.
pub fn wifi_access_points(count: usize) -> Vec<WirelessObservation> {
    (0..count)
        .map(|i| {
            let i = i as u32;
            WirelessObservation::wifi(
                [0xa4, 0x2b, 0xb0, (i >> 16) as u8, (i >> 8) as u8, i as u8],
                -40 - (i % 50) as i32,
                1 + (i % 13) as i32,
            )
        })
        .collect()
}

/// Returns `count` distinct, valid cell tower observations of a german operator.
pub fn cell_towers(count: usize) -> Vec<WirelessObservation> {
    (0..count)
        .map(|i| WirelessObservation::cell(26_871_000 + i as u32, 41_012, 262, 2))
        .collect()
}
