mod scanner;
mod status;
mod transport;

use crate::scanner::CsvScanner;
use crate::status::StatusLog;
use crate::transport::SimulatedTransport;
use clap::{CommandFactory, Parser};
use common::observation::ScanHeader;
use common::position::Coordinate;
use dirs::config_dir;
use gnss::{constant_source::ConstantGnssModule, gpsd_source::GpsdModule};
use module_core::{Event, EventBus, EventKind, Module};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracker::TrackerModule;
use tracker::config::TrackerConfig;

const FAKE_GPS_VELOCITY: f64 = 10.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file, defaults to <config dir>/fleet-tracker/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short = 'd', long)]
    gpsd: bool,
    #[arg(long, default_value = "127.0.0.1:2947")]
    gpsd_address: String,
    #[arg(short, long)]
    gps_fake: bool,
    /// Route for --gps-fake, CSV with longitude and latitude
    #[arg(short = 'f', long)]
    gps_source_file: Option<String>,
    /// Report invalid fixes after this many fake fixes
    #[arg(long)]
    gps_outage_after: Option<usize>,
    /// Wireless observations reported by every scan
    #[arg(short, long)]
    scan_file: Option<PathBuf>,
    /// Scan cell towers of this operator instead of Wi-Fi access points
    #[arg(long)]
    cellular_operator: Option<String>,
    /// Never connect to the cloud
    #[arg(long)]
    offline: bool,
    /// Answer of the geolocation service, e.g. "52.52,13.405,40"
    #[arg(long)]
    network_reply: Option<String>,
}

fn read_route_from_file(file_path: &str) -> Result<Vec<Coordinate>, ()> {
    let mut rdr = csv::Reader::from_path(file_path).map_err(|e| {
        error!("Failed to open route {file_path}. Error: {e}");
    })?;
    let mut route = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| error!("Failed to read route. Error: {e}"))?;
        let (Some(longitude), Some(latitude)) = (record.get(0), record.get(1)) else {
            error!("Route line {:?} has less than two columns", record.position());
            return Err(());
        };
        let (Ok(longitude), Ok(latitude)) = (f64::from_str(longitude), f64::from_str(latitude))
        else {
            error!("Route line {:?} is not a coordinate", record.position());
            return Err(());
        };
        route.push(Coordinate::new(latitude, longitude));
    }
    debug!("length of route: {}", route.len());
    Ok(route)
}

async fn get_gpsd_module(eb: &EventBus, address: &str) -> Result<Box<dyn Module>, ()> {
    match GpsdModule::new(eb.context(), address).await {
        Ok(gpsd) => Ok(Box::new(gpsd)),
        Err(e) => {
            error!("Failed to connect to gpsd!. Error: {}", e);
            Err(())
        }
    }
}

fn create_fake_gps_module(eb: &EventBus, cli: &Cli) -> Result<Box<dyn Module>, ()> {
    let Some(source_file) = &cli.gps_source_file else {
        error!("Failed to create ConstantGnssModule. Error: gps_source_file not set");
        let _ = Cli::command().print_help();
        return Err(());
    };
    let route = read_route_from_file(source_file)?;
    let mut module = ConstantGnssModule::new(eb.context(), &route, FAKE_GPS_VELOCITY)
        .map_err(|e| error!("Failed to create ConstantGnssModule. Error: {e}"))?;
    if let Some(fixes) = cli.gps_outage_after {
        module = module.with_outage_after(fixes);
    }
    Ok(Box::new(module))
}

fn load_config(cli: &Cli) -> Result<TrackerConfig, ()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => {
            let mut path = config_dir().ok_or_else(|| {
                error!("Could not determine config directory");
            })?;
            path.push("fleet-tracker");
            path.push("config.json");
            path
        }
    };
    TrackerConfig::load(&path).map_err(|e| error!("{e}"))
}

fn install_quit_handler(eb: &EventBus) -> Result<(), ()> {
    let sender = eb.sender();
    ctrlc::set_handler(move || {
        info!("Stopping...");
        let _ = sender.send(Event {
            kind: EventKind::QuitEvent,
        });
    })
    .map_err(|e| error!("Failed to install Ctrl-C handler. Error: {e}"))
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = load_config(&cli)?;
    let eb = EventBus::default();
    let mut gps: Option<Box<dyn Module>> = if cli.gpsd {
        Some(get_gpsd_module(&eb, &cli.gpsd_address).await?)
    } else if cli.gps_fake {
        Some(create_fake_gps_module(&eb, &cli)?)
    } else {
        info!("No GPS source specified, relying on network locations only");
        None
    };

    let header = match &cli.cellular_operator {
        Some(operator) => ScanHeader::Cellular {
            operator: operator.clone(),
        },
        None => ScanHeader::Wifi { consider_ip: true },
    };
    let transport = SimulatedTransport::new(!cli.offline, cli.network_reply.clone());
    let scanner = CsvScanner::new(header, cli.scan_file.clone());
    let mut tracker = TrackerModule::new(
        eb.context(),
        &config,
        Box::new(transport),
        Box::new(scanner),
    );
    let mut status = StatusLog::new(eb.context());
    install_quit_handler(&eb)?;

    info!("Starting modules...");
    let gps_task = async {
        match gps.as_mut() {
            Some(gps) => gps.run().await,
            None => Ok(()),
        }
    };
    let (gps, tracker, status) = tokio::join!(gps_task, tracker.run(), status.run());
    gps.and(tracker).and(status)
}
