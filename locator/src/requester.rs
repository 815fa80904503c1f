// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::encoder::ScanResultEncoder;
use crate::transport::{Transport, Visibility, WirelessScanner};
pub use common::request::RequestOutcome;
use common::time_source::{MonotonicTimeSource, TimeSource};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shortest period between two requests in [`Mode::Periodic`].
pub const MIN_PERIOD: Duration = Duration::from_millis(5000);

/// Delay between connecting and the first request.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(8000);

pub const DEFAULT_EVENT_NAME: &str = "deviceLocator";

/// When location requests are performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// One request after the first connect.
    Once,
    /// A request every period while connected.
    ///
    /// Periods below [`MIN_PERIOD`] are raised to it.
    Periodic(Duration),
    /// Requests are only performed when explicitly triggered.
    Manual,
}

impl Mode {
    /// The effective request period, `None` for non-periodic modes.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Mode::Periodic(period) => Some((*period).max(MIN_PERIOD)),
            Mode::Once | Mode::Manual => None,
        }
    }
}

/// State of the [`NetworkLocationRequester`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequesterState {
    /// Waiting for the transport to connect.
    AwaitingConnection,
    /// Connected, waiting for the settle delay to pass.
    ConnectedSettling,
    /// Performing periodic requests.
    Active,
    /// Nothing happens automatically anymore.
    Idle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequesterConfig {
    pub mode: Mode,
    pub settle_delay: Duration,
    pub event_name: String,
    pub visibility: Visibility,
    /// Limits replies to this device if set.
    pub device_id: Option<String>,
}

impl RequesterConfig {
    pub fn new(mode: Mode) -> Self {
        RequesterConfig {
            mode,
            ..Default::default()
        }
    }

    /// The topic the geolocation service answers on.
    pub fn reply_topic(&self) -> String {
        match &self.device_id {
            Some(device_id) => format!("hook-response/{}/{}", self.event_name, device_id),
            None => format!("hook-response/{}", self.event_name),
        }
    }
}

impl Default for RequesterConfig {
    fn default() -> Self {
        RequesterConfig {
            mode: Mode::Manual,
            settle_delay: DEFAULT_SETTLE_DELAY,
            event_name: DEFAULT_EVENT_NAME.to_string(),
            visibility: Visibility::Private,
            device_id: None,
        }
    }
}

/// Decides when to request a network derived position and performs the
/// request.
///
/// [`tick`](Self::tick) must be called regularly. The replies are not
/// handled here, they arrive through the subscription on
/// [`RequesterConfig::reply_topic`].
///
/// # Type Parameters
/// - `T`: The time source, defaults to [`MonotonicTimeSource`].
pub struct NetworkLocationRequester<T: TimeSource = MonotonicTimeSource> {
    config: RequesterConfig,
    state: RequesterState,
    state_entered_us: u64,
    last_request_us: Option<u64>,
    time_source: T,
    encoder: ScanResultEncoder,
}

impl NetworkLocationRequester<MonotonicTimeSource> {
    /// Creates a new requester using the default [`MonotonicTimeSource`].
    pub fn new(config: RequesterConfig) -> Self {
        NetworkLocationRequester::new_with_source(config, MonotonicTimeSource::default())
    }
}

impl<T: TimeSource> NetworkLocationRequester<T> {
    /// Creates a new requester with a custom time source.
    pub fn new_with_source(config: RequesterConfig, time_source: T) -> Self {
        NetworkLocationRequester {
            config,
            state: RequesterState::AwaitingConnection,
            state_entered_us: 0,
            last_request_us: None,
            time_source,
            encoder: ScanResultEncoder::new(),
        }
    }

    pub fn state(&self) -> RequesterState {
        self.state
    }

    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    /// Advances the state machine by one tick and performs a request if one
    /// is due.
    ///
    /// Returns the outcome of the request, or `None` if none was due.
    pub fn tick(
        &mut self,
        transport: &mut dyn Transport,
        scanner: &mut dyn WirelessScanner,
    ) -> Option<RequestOutcome> {
        if self.advance(transport.is_connected()) {
            Some(self.request_location(transport, scanner))
        } else {
            None
        }
    }

    /// Advances the state machine by one tick.
    ///
    /// The next state depends only on the current state, the time spent in
    /// it, `connected` and the configured mode. Returns `true` if a request
    /// is due on this tick.
    pub fn advance(&mut self, connected: bool) -> bool {
        let now = self.time_source.now_us();
        match self.state {
            RequesterState::AwaitingConnection => {
                if connected {
                    self.enter(RequesterState::ConnectedSettling, now);
                }
                false
            }
            RequesterState::ConnectedSettling => {
                if now.saturating_sub(self.state_entered_us) < as_micros(self.config.settle_delay)
                {
                    return false;
                }
                match self.config.mode {
                    Mode::Once => {
                        self.enter(RequesterState::Idle, now);
                        true
                    }
                    Mode::Manual => {
                        self.enter(RequesterState::Idle, now);
                        false
                    }
                    Mode::Periodic(_) => {
                        self.enter(RequesterState::Active, now);
                        self.last_request_us = None;
                        self.advance_active(connected, now)
                    }
                }
            }
            RequesterState::Active => self.advance_active(connected, now),
            RequesterState::Idle => false,
        }
    }

    fn advance_active(&mut self, connected: bool, now: u64) -> bool {
        if !connected {
            // The period timer is dropped, a reconnect settles again first.
            self.last_request_us = None;
            self.enter(RequesterState::AwaitingConnection, now);
            return false;
        }
        let period = self.config.mode.period().unwrap_or(MIN_PERIOD);
        let due = self
            .last_request_us
            .is_none_or(|last| now.saturating_sub(last) >= as_micros(period));
        if due {
            self.last_request_us = Some(now);
        }
        due
    }

    fn enter(&mut self, state: RequesterState, now: u64) {
        info!("Locator state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_entered_us = now;
    }

    /// Scans, encodes and publishes the nearby wireless observations.
    ///
    /// This is the explicit trigger in [`Mode::Manual`]; the state machine
    /// calls it for the other modes. Publishing is skipped while the
    /// transport is disconnected.
    pub fn request_location(
        &mut self,
        transport: &mut dyn Transport,
        scanner: &mut dyn WirelessScanner,
    ) -> RequestOutcome {
        let scan = match scanner.scan() {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Wireless scan failed. Error: {e}");
                return RequestOutcome::ScanFailed;
            }
        };
        let summary = self.encoder.encode(&scan.header, &scan.observations);
        if self.encoder.is_empty() {
            debug!(
                "Nothing to report, {} of {} observations invalid",
                summary.invalid,
                scan.observations.len()
            );
            return RequestOutcome::NothingToReport;
        }
        if !transport.is_connected() {
            debug!("Transport disconnected, location request skipped");
            return RequestOutcome::Disconnected;
        }
        debug!("Publishing location request {}", self.encoder.payload());
        if transport.publish(
            &self.config.event_name,
            self.encoder.payload(),
            self.config.visibility,
        ) {
            info!(
                "Location request published with {} observations",
                summary.appended
            );
            RequestOutcome::Published {
                observations: summary.appended,
            }
        } else {
            warn!("Failed to publish location request");
            RequestOutcome::PublishFailed
        }
    }
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
