// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! The tracker module ties the network locator, the position arbiter and
//! the beacon to the event bus.

pub mod beacon;
pub mod config;
pub mod scheduler;

use crate::config::TrackerConfig;
use crate::scheduler::Scheduler;
use common::time_source::MonotonicTimeSource;
use locator::transport::{Transport, WirelessScanner};
use module_core::{EventKind, GnssFixPtr, Module, ModuleCtx};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

pub type BoxedTransport = Box<dyn Transport + Send>;
pub type BoxedScanner = Box<dyn WirelessScanner + Send>;

pub struct TrackerModule {
    ctx: ModuleCtx,
    scheduler: Scheduler<MonotonicTimeSource>,
    transport: BoxedTransport,
    scanner: BoxedScanner,
    tick_interval: Duration,
}

impl TrackerModule {
    pub fn new(
        ctx: ModuleCtx,
        config: &TrackerConfig,
        mut transport: BoxedTransport,
        scanner: BoxedScanner,
    ) -> Self {
        let scheduler = Scheduler::new(config, MonotonicTimeSource::new(), transport.as_mut());
        TrackerModule {
            ctx,
            scheduler,
            transport,
            scanner,
            tick_interval: config.tick_interval(),
        }
    }

    fn handle_tick(&mut self, gps_fix: Option<GnssFixPtr>) {
        let report = self.scheduler.tick(
            self.transport.as_mut(),
            self.scanner.as_mut(),
            gps_fix.as_deref(),
        );
        if let Some(outcome) = report.request {
            let _ = self
                .ctx
                .publish_event(EventKind::LocationRequestEvent(outcome));
        }
        if report.position_changed {
            let position = Arc::new(*self.scheduler.current_position());
            let _ = self
                .ctx
                .publish_event(EventKind::PositionUpdatedEvent(position));
        }
    }

    fn handle_location_request(&mut self) {
        let outcome = self
            .scheduler
            .request_location(self.transport.as_mut(), self.scanner.as_mut());
        let _ = self
            .ctx
            .publish_event(EventKind::LocationRequestEvent(outcome));
    }
}

#[async_trait::async_trait]
impl Module for TrackerModule {
    async fn run(&mut self) -> Result<(), ()> {
        let mut timer = tokio::time::interval(self.tick_interval);
        let mut latest_fix: Option<GnssFixPtr> = None;
        info!("Tracker running with a tick of {:?}", self.tick_interval);
        loop {
            tokio::select! {
                _ = timer.tick() => self.handle_tick(latest_fix.take()),
                event = self.ctx.receiver.recv() => match event {
                    Ok(event) => match event.kind {
                        EventKind::QuitEvent => break,
                        EventKind::GnssFixEvent(fix) => latest_fix = Some(fix),
                        EventKind::RequestLocationEvent => self.handle_location_request(),
                        _ => {}
                    },
                    Err(RecvError::Lagged(skipped)) => debug!("Skipped {skipped} events"),
                    Err(RecvError::Closed) => break,
                }
            }
        }
        info!("Tracker stopped");
        Ok(())
    }
}
