use crate::transport::{Scan, ScanError, WirelessScanner};
use common::observation::{ScanHeader, WirelessObservation};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// A [`WirelessScanner`] for tests that reports the same scan every time.
#[derive(Clone)]
pub struct ScriptedScanner {
    scan: Option<Scan>,
    scans: Arc<AtomicUsize>,
}

impl ScriptedScanner {
    pub fn new(header: ScanHeader, observations: Vec<WirelessObservation>) -> Self {
        ScriptedScanner {
            scan: Some(Scan {
                header,
                observations,
            }),
            scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A Wi-Fi scanner reporting `observations`.
    pub fn wifi(observations: Vec<WirelessObservation>) -> Self {
        Self::new(ScanHeader::Wifi { consider_ip: true }, observations)
    }

    /// A scanner whose radio never becomes ready.
    pub fn failing() -> Self {
        ScriptedScanner {
            scan: None,
            scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of scans performed over all clones.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl WirelessScanner for ScriptedScanner {
    fn scan(&mut self) -> Result<Scan, ScanError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.scan.clone().ok_or(ScanError::NotReady)
    }
}
