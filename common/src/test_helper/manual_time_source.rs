use crate::time_source::TimeSource;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

/// A test implementation of [`TimeSource`] that allows deterministic
/// control of time in unit tests.
///
/// Clones share the same counter, so a test can keep one clone and hand
/// another one to the component under test.
#[derive(Clone, Debug, Default)]
pub struct ManualTimeSource {
    now_us: Arc<AtomicU64>,
}

impl ManualTimeSource {
    /// Creates a time source that starts at `start`.
    pub fn starting_at(start: Duration) -> Self {
        let source = Self::default();
        source.set(start);
        source
    }

    /// Sets the current time.
    pub fn set(&self, now: Duration) {
        self.now_us.store(as_micros(now), Ordering::SeqCst);
    }

    /// Moves the current time forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.now_us.fetch_add(as_micros(step), Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros())
        .unwrap_or_else(|_| panic!("Duration {duration:?} does not fit the test time source"))
}
