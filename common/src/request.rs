// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

/// Result of a single location request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The scan was published with the given number of observations.
    Published { observations: usize },
    /// The scan contained no usable observation.
    NothingToReport,
    /// The transport is disconnected, nothing was published.
    Disconnected,
    /// The transport refused the publish.
    PublishFailed,
    /// The radio could not scan.
    ScanFailed,
}
