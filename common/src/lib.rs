// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common Modul for the fleet tracker
//!
//! Provides the common data types that are used across every modul.

pub mod observation;
pub mod position;
pub mod request;
pub mod test_helper;
pub mod time_source;
