// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use std::time::{Duration, Instant};

/// A monotonic clock measured in microseconds since an arbitrary origin.
///
/// The origin is usually the moment the time source was created. Every
/// component that needs "now" receives a `TimeSource`, which allows tests to
/// control the passing of time.
///
/// The underlying time source must be monotonic to ensure that measured
/// durations are not affected by system clock adjustments.
pub trait TimeSource {
    /// Returns the current time in microseconds since the origin.
    fn now_us(&self) -> u64;

    /// Returns the current time as [`Duration`] since the origin.
    fn now(&self) -> Duration {
        Duration::from_micros(self.now_us())
    }

    /// Returns the microseconds passed since `reference_us`.
    ///
    /// Saturates at zero if `reference_us` lies in the future.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// A [`TimeSource`] backed by [`Instant`].
///
/// The origin is the moment the struct is created. Clones share the same
/// origin, so several components can be fed from one clock.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        MonotonicTimeSource {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now_us(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}
