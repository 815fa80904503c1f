use chrono::Utc;
use common::position::{Coordinate, GnssFix};
use module_core::{EventKind, Module, ModuleCtx};
use std::{
    io::{Error, ErrorKind},
    sync::Arc,
    time::Duration,
};
use tokio::sync::broadcast::{Sender, error::RecvError};
use tracing::{debug, info, warn};
use utm::{lat_lon_to_zone_number, lat_to_zone_letter, to_utm_wgs84, wsg84_utm_to_lat_lon};

/// Interval between two reported fixes.
pub const FIX_INTERVAL: Duration = Duration::from_millis(100);

const SATELLITES: i32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct UtmPoint {
    northing: f64,
    easting: f64,
}

/// All route points share the zone of the first one.
#[derive(Debug, Clone, Copy)]
struct UtmZone {
    number: u8,
    letter: char,
}

#[derive(Clone)]
struct ConstantGnssModuleConfig {
    points: Vec<UtmPoint>,
    zone: UtmZone,
    velocity: f64,
    outage_after: Option<usize>,
}

/// Moves along the route, one step per tick.
struct RouteRuntime {
    config: Arc<ConstantGnssModuleConfig>,
    current: UtmPoint,
    next_point: usize,
    reported: usize,
    sender: Sender<module_core::Event>,
}

impl RouteRuntime {
    fn new(config: Arc<ConstantGnssModuleConfig>, sender: Sender<module_core::Event>) -> Self {
        RouteRuntime {
            current: config.points[0],
            next_point: 1 % config.points.len(),
            reported: 0,
            config,
            sender,
        }
    }

    fn handle_tick(&mut self) {
        let Ok((latitude, longitude)) = wsg84_utm_to_lat_lon(
            self.current.easting,
            self.current.northing,
            self.config.zone.number,
            self.config.zone.letter,
        ) else {
            warn!("UTM point {:?} can't be converted back", self.current);
            return;
        };

        let mut fix = GnssFix::new(latitude, longitude, 0.0, self.config.velocity, SATELLITES)
            .with_utc(Utc::now());
        if self
            .config
            .outage_after
            .is_some_and(|outage_after| self.reported >= outage_after)
        {
            fix = fix.invalid();
        }
        self.reported += 1;
        let _ = self.sender.send(module_core::Event {
            kind: EventKind::GnssFixEvent(Arc::new(fix)),
        });

        let step = self.config.velocity * FIX_INTERVAL.as_secs_f64();
        self.advance(step);
    }

    /// Moves `distance` meters along the route, wrapping to its start.
    fn advance(&mut self, distance: f64) {
        let mut remaining = distance;
        for _ in 0..self.config.points.len() {
            let target = self.config.points[self.next_point];
            let d_north = target.northing - self.current.northing;
            let d_east = target.easting - self.current.easting;
            let length = (d_north * d_north + d_east * d_east).sqrt();
            if length > remaining {
                self.current.northing += d_north / length * remaining;
                self.current.easting += d_east / length * remaining;
                return;
            }
            self.current = target;
            remaining -= length;
            self.next_point = (self.next_point + 1) % self.config.points.len();
        }
    }
}

fn convert_route(route: &[Coordinate]) -> Result<(Vec<UtmPoint>, UtmZone), Error> {
    let first = route
        .first()
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "route is empty"))?;
    let number = lat_lon_to_zone_number(first.latitude, first.longitude);
    let letter = lat_to_zone_letter(first.latitude).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidData,
            format!(
                "Coordinate lat: {}, long: {} can't be converted to an UTM zone",
                first.latitude, first.longitude
            ),
        )
    })?;
    let points = route
        .iter()
        .map(|coordinate| {
            let (northing, easting, _) =
                to_utm_wgs84(coordinate.latitude, coordinate.longitude, number);
            UtmPoint { northing, easting }
        })
        .collect();
    Ok((points, UtmZone { number, letter }))
}

/// A GNSS source that drives along a route with constant velocity.
///
/// A fix is reported every [`FIX_INTERVAL`]. After reaching the last
/// coordinate the route starts over.
pub struct ConstantGnssModule {
    ctx: ModuleCtx,
    config: Arc<ConstantGnssModuleConfig>,
}

impl ConstantGnssModule {
    /// Creates the module for `route`, `velocity` is in meters per second.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidData`] if the route is empty or outside of
    /// the UTM zones.
    pub fn new(ctx: ModuleCtx, route: &[Coordinate], velocity: f64) -> Result<Self, Error> {
        let (points, zone) = convert_route(route)?;
        Ok(ConstantGnssModule {
            ctx,
            config: Arc::new(ConstantGnssModuleConfig {
                points,
                zone,
                velocity,
                outage_after: None,
            }),
        })
    }

    /// Simulates a lost satellite lock: every fix after the first `fixes`
    /// is reported as invalid.
    pub fn with_outage_after(mut self, fixes: usize) -> Self {
        Arc::make_mut(&mut self.config).outage_after = Some(fixes);
        self
    }
}

#[async_trait::async_trait]
impl Module for ConstantGnssModule {
    async fn run(&mut self) -> Result<(), ()> {
        let mut runtime = RouteRuntime::new(self.config.clone(), self.ctx.sender.clone());
        let route_task_handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(FIX_INTERVAL);
            loop {
                timer.tick().await;
                runtime.handle_tick();
            }
        });
        info!(
            "Replaying route of {} points with {} m/s",
            self.config.points.len(),
            self.config.velocity
        );

        loop {
            match self.ctx.receiver.recv().await {
                Ok(event) => {
                    if let EventKind::QuitEvent = event.kind {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            }
        }
        route_task_handle.abort();
        Ok(())
    }
}
