// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use std::str::FromStr;
use thiserror::Error;

/// A position answered by the geolocation service.
///
/// The reply payload is `lat,lon,accuracy` in decimal text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetworkFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("Reply is missing the {0} field")]
    MissingField(&'static str),

    #[error("Reply field {field} is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

impl FromStr for NetworkFix {
    type Err = ReplyError;

    /// Parses a reply, fields after the accuracy are ignored.
    ///
    /// Empty fields are skipped, so `"1,,2,3"` reads as `1,2,3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(',').map(str::trim).filter(|field| !field.is_empty());
        let latitude = parse_field(fields.next(), "latitude")?;
        let longitude = parse_field(fields.next(), "longitude")?;
        let accuracy = parse_field(fields.next(), "accuracy")?;
        Ok(NetworkFix {
            latitude,
            longitude,
            accuracy,
        })
    }
}

fn parse_field(field: Option<&str>, name: &'static str) -> Result<f64, ReplyError> {
    let field = field.ok_or(ReplyError::MissingField(name))?;
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ReplyError::InvalidNumber {
            field: name,
            value: field.to_string(),
        }),
    }
}
