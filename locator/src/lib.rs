// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Network location for the fleet tracker
//!
//! Decides when to ask the cloud for a Wi-Fi or cell tower based position,
//! encodes the nearby wireless observations into a size capped payload and
//! parses the asynchronous reply.

pub mod encoder;
pub mod reply;
pub mod requester;
pub mod test_helper;
pub mod transport;
