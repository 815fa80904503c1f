// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Modules that deliver [`GnssFix`](common::position::GnssFix)es on the event bus.

pub mod constant_source;
pub mod gpsd_source;
