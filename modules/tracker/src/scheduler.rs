// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::beacon::PositionBeacon;
use crate::config::TrackerConfig;
use algorithm::arbiter::{Arbitration, PositionArbiter};
use common::position::{GnssFix, Position};
use common::time_source::{MonotonicTimeSource, TimeSource};
use locator::reply::NetworkFix;
use locator::requester::{NetworkLocationRequester, RequestOutcome, RequesterState};
use locator::transport::{Transport, WirelessScanner};
use std::sync::mpsc::{Receiver, channel};
use tracing::{debug, warn};

/// What happened during one [`Scheduler::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Outcome of the location request, if one was due.
    pub request: Option<RequestOutcome>,
    /// A fix was accepted as the new authoritative position.
    pub position_changed: bool,
    pub beacon_published: bool,
    /// Replies discarded because a recent GPS fix wins.
    pub replies_rejected: usize,
    /// Replies that could not be parsed.
    pub replies_malformed: usize,
}

/// Drives the location request, the position arbitration and the beacon
/// from a single loop.
///
/// Everything happens on the caller's thread inside [`tick`](Self::tick).
/// Replies of the geolocation service are queued by the transport and
/// applied on the next tick.
pub struct Scheduler<T: TimeSource + Clone = MonotonicTimeSource> {
    requester: NetworkLocationRequester<T>,
    arbiter: PositionArbiter<T>,
    beacon: PositionBeacon<T>,
    replies: Receiver<String>,
}

impl<T: TimeSource + Clone> Scheduler<T> {
    /// Creates the scheduler and subscribes to the replies on `transport`.
    pub fn new(config: &TrackerConfig, time_source: T, transport: &mut dyn Transport) -> Self {
        let requester_config = config.requester_config();
        let (sender, replies) = channel();
        let topic = requester_config.reply_topic();
        if !transport.subscribe(&topic, sender) {
            warn!("Failed to subscribe to {topic}, network fixes will not arrive");
        }
        Scheduler {
            requester: NetworkLocationRequester::new_with_source(
                requester_config,
                time_source.clone(),
            ),
            arbiter: PositionArbiter::new_with_source(config.drift_window(), time_source.clone()),
            beacon: PositionBeacon::new(
                &config.beacon_event_name,
                config.beacon_interval(),
                time_source,
            ),
            replies,
        }
    }

    /// Runs one iteration of the tracker loop.
    ///
    /// `gps_fix` is the latest reading of the GPS receiver, if any arrived
    /// since the last tick.
    pub fn tick(
        &mut self,
        transport: &mut dyn Transport,
        scanner: &mut dyn WirelessScanner,
        gps_fix: Option<&GnssFix>,
    ) -> TickReport {
        let mut report = TickReport {
            request: self.requester.tick(transport, scanner),
            ..Default::default()
        };

        if let Some(fix) = gps_fix {
            report.position_changed |= self.arbiter.update_gps_fix(fix).is_accepted();
        }

        while let Ok(reply) = self.replies.try_recv() {
            let fix = match reply.parse::<NetworkFix>() {
                Ok(fix) => fix,
                Err(e) => {
                    warn!("Discarding reply '{reply}'. Error: {e}");
                    report.replies_malformed += 1;
                    continue;
                }
            };
            match self
                .arbiter
                .update_network_fix(fix.latitude, fix.longitude, fix.accuracy)
            {
                Arbitration::Accepted(_) => report.position_changed = true,
                _ => report.replies_rejected += 1,
            }
        }

        report.beacon_published = self.beacon.tick(transport, self.arbiter.current_position());
        if report != TickReport::default() {
            debug!("Tick {:?}", report);
        }
        report
    }

    /// Performs a location request right now, regardless of the mode.
    pub fn request_location(
        &mut self,
        transport: &mut dyn Transport,
        scanner: &mut dyn WirelessScanner,
    ) -> RequestOutcome {
        self.requester.request_location(transport, scanner)
    }

    pub fn current_position(&self) -> &Position {
        self.arbiter.current_position()
    }

    pub fn requester_state(&self) -> RequesterState {
        self.requester.state()
    }

    pub fn arbiter(&self) -> &PositionArbiter<T> {
        &self.arbiter
    }
}
