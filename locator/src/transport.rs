// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::observation::{ScanHeader, WirelessObservation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel end handed to [`Transport::subscribe`].
///
/// The transport pushes every reply payload into it. The owner of the
/// receiving end drains it on its own tick, so replies never interrupt a
/// running tick.
pub type ReplySender = std::sync::mpsc::Sender<String>;

/// Who may see a published event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// The cloud link of the device.
///
/// Delivery is best effort: a successful [`publish`](Transport::publish) only
/// means the event left the device.
pub trait Transport {
    /// `true` while the device is connected to the cloud.
    fn is_connected(&self) -> bool;

    /// Publishes `payload` as event `event_name`.
    ///
    /// Returns `false` if the event could not be sent.
    fn publish(&mut self, event_name: &str, payload: &str, visibility: Visibility) -> bool;

    /// Subscribes `handler` to every event whose name starts with `topic`.
    ///
    /// Returns `false` if the subscription could not be registered.
    fn subscribe(&mut self, topic: &str, handler: ReplySender) -> bool;
}

/// The result of a single wireless scan.
#[derive(Clone, Debug, PartialEq)]
pub struct Scan {
    pub header: ScanHeader,
    /// Observations in the order the radio reported them.
    pub observations: Vec<WirelessObservation>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("Radio is not ready")]
    NotReady,

    #[error("Scan failed: {0}")]
    Failed(String),
}

/// Produces the nearby wireless observations.
///
/// Every call performs a fresh scan.
pub trait WirelessScanner {
    fn scan(&mut self) -> Result<Scan, ScanError>;
}
