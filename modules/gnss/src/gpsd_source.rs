use chrono::{DateTime, Utc};
use common::position::GnssFix;
use futures::StreamExt;
use gpsd_proto::{self, Mode, Satellite, Sky, Tpv};
use module_core::{Event, EventKind, Module, ModuleCtx};
use std::{
    io::{self, Error, ErrorKind},
    net::SocketAddr,
    str::FromStr,
    sync::Arc,
};
use tokio::sync::Notify;
use tokio::sync::broadcast::error::RecvError;
use tokio::{io::AsyncWriteExt, net::TcpStream};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

/// Converts the reports of the GPSD daemon into [`GnssFix`]es.
struct GpsdFixRuntime {
    /// Satellites used for the fix, taken from the last SKY report
    satellites: i32,
    /// The start signal for the GPSD task to start execution
    notify: Arc<Notify>,
    /// The sender of the event bus to emit the fixes
    sender: tokio::sync::broadcast::Sender<Event>,
}

impl GpsdFixRuntime {
    fn new(sender: tokio::sync::broadcast::Sender<Event>) -> Self {
        GpsdFixRuntime {
            satellites: 0,
            notify: Arc::new(Notify::new()),
            sender,
        }
    }

    fn process_tpv_msg(&mut self, tpv: &Tpv, altitude: Option<f64>) {
        let (Some(latitude), Some(longitude)) = (tpv.lat, tpv.lon) else {
            debug!("TPV report without position");
            return;
        };
        let speed: f64 = tpv.speed.map(Into::into).unwrap_or(0.0);
        let mut fix = GnssFix::new(
            latitude,
            longitude,
            altitude.unwrap_or(0.0),
            speed,
            self.satellites,
        );
        fix.valid = has_fix(&tpv.mode);
        if let Some(utc) = tpv
            .time
            .as_deref()
            .and_then(|time| DateTime::<Utc>::from_str(time).ok())
        {
            fix = fix.with_utc(utc);
        }
        let _ = self.sender.send(Event {
            kind: EventKind::GnssFixEvent(Arc::new(fix)),
        });
    }

    fn process_sky_msg(&mut self, sky: &Sky) {
        let Some(ref satellites) = sky.satellites else {
            return;
        };
        self.satellites = used_satellites(satellites);
    }
}

fn has_fix(mode: &Mode) -> bool {
    match mode {
        Mode::NoFix => false,
        Mode::Fix2d | Mode::Fix3d => true,
    }
}

fn used_satellites(satellites: &[Satellite]) -> i32 {
    let used = satellites.iter().filter(|s| s.used).count();
    i32::try_from(used).unwrap_or(i32::MAX)
}

/// Altitude of a TPV report in meters.
///
/// Newer daemons report `altMSL`/`altHAE`, older ones only `alt`.
fn tpv_altitude(report: &serde_json::Value) -> Option<f64> {
    ["altMSL", "alt", "altHAE"]
        .iter()
        .find_map(|key| report.get(key).and_then(serde_json::Value::as_f64))
}

fn process_line(runtime: &mut GpsdFixRuntime, line: &str) {
    let Ok(report) = serde_json::from_str::<serde_json::Value>(line) else {
        debug!("Ignoring malformed GPSD line {line}");
        return;
    };
    match report.get("class").and_then(serde_json::Value::as_str) {
        Some("TPV") => match serde_json::from_value::<Tpv>(report.clone()) {
            Ok(tpv) => runtime.process_tpv_msg(&tpv, tpv_altitude(&report)),
            Err(e) => warn!("Invalid TPV report. Error: {e}"),
        },
        Some("SKY") => match serde_json::from_value::<Sky>(report) {
            Ok(sky) => runtime.process_sky_msg(&sky),
            Err(e) => warn!("Invalid SKY report. Error: {e}"),
        },
        _ => {}
    }
}

async fn gpsd_reader(mut stream: TcpStream, mut runtime: GpsdFixRuntime) {
    runtime.notify.notified().await;
    if let Err(e) = stream
        .write_all(gpsd_proto::ENABLE_WATCH_CMD.as_bytes())
        .await
    {
        error!("Failed to enable GPSD watch mode. Error: {e}");
        return;
    }
    let mut framed = Framed::new(stream, LinesCodec::new());
    while let Some(result) = framed.next().await {
        match result {
            Ok(ref line) => process_line(&mut runtime, line),
            Err(e) => {
                warn!("GPSD receive error {e:?}");
            }
        }
    }
    info!("GPSD connection closed");
}

/// A GNSS source backed by the GPSD daemon.
pub struct GpsdModule {
    ctx: ModuleCtx,
    gpsd_handle: tokio::task::JoinHandle<()>,
    task_notify: Arc<Notify>,
}

impl GpsdModule {
    /// Connects to the daemon at `address`, e.g. `127.0.0.1:2947`.
    ///
    /// Reports are only read once the module runs.
    pub async fn new(ctx: ModuleCtx, address: &str) -> Result<Self, Error> {
        let address: SocketAddr = match address.parse() {
            Ok(addr) => addr,
            Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e)),
        };
        let socket = TcpStream::connect(address).await?;
        let rt = GpsdFixRuntime::new(ctx.sender.clone());
        let notify = rt.notify.clone();
        let gpsd_reader_task_handle = tokio::spawn(async move { gpsd_reader(socket, rt).await });
        Ok(GpsdModule {
            ctx,
            gpsd_handle: gpsd_reader_task_handle,
            task_notify: notify,
        })
    }
}

#[async_trait::async_trait]
impl Module for GpsdModule {
    async fn run(&mut self) -> Result<(), ()> {
        self.task_notify.notify_one();
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
        self.gpsd_handle.abort();
        Ok(())
    }
}
