//! SP3 record line decoding, at fixed column offsets.
use std::str::FromStr;

use thiserror::Error;

use hifitime::{Epoch, TimeScale};

use crate::prelude::SV;

#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("failed to parse epoch year from \"{0}\"")]
    EpochYear(String),
    #[error("failed to parse epoch month from \"{0}\"")]
    EpochMonth(String),
    #[error("failed to parse epoch day from \"{0}\"")]
    EpochDay(String),
    #[error("failed to parse epoch hours from \"{0}\"")]
    EpochHours(String),
    #[error("failed to parse epoch minutes from \"{0}\"")]
    EpochMinutes(String),
    #[error("failed to parse epoch seconds from \"{0}\"")]
    EpochSeconds(String),
    #[error("invalid calendar date")]
    Epoch,
    #[error("failed to parse sv from \"{0}\"")]
    Vehicle(String),
    #[error("failed to parse (x, y or z) coordinate from \"{0}\"")]
    Coordinates(String),
    #[error("line truncated before column {0}")]
    Truncated(usize),
}

/// Returns the `start..end` column slice, tolerating lines whose
/// trailing field was cut short by a concurrent download.
fn column(line: &str, start: usize, end: usize) -> Result<&str, ParsingError> {
    if line.len() <= start {
        return Err(ParsingError::Truncated(start));
    }
    Ok(&line[start..end.min(line.len())])
}

/// Epoch lines carry the timestamp all following records bind to.
pub fn is_epoch_line(line: &str) -> bool {
    line.starts_with('*')
}

/// Position record lines.
pub fn is_position_line(line: &str) -> bool {
    line.starts_with('P')
}

/// Decodes an epoch line into UNIX seconds (UTC).
pub fn parse_epoch_line(line: &str) -> Result<i64, ParsingError> {
    let year = i32::from_str(column(line, 3, 7)?.trim())
        .or(Err(ParsingError::EpochYear(line.to_string())))?;

    let month = u8::from_str(column(line, 8, 10)?.trim())
        .or(Err(ParsingError::EpochMonth(line.to_string())))?;

    let day = u8::from_str(column(line, 11, 13)?.trim())
        .or(Err(ParsingError::EpochDay(line.to_string())))?;

    let hours = u8::from_str(column(line, 14, 16)?.trim())
        .or(Err(ParsingError::EpochHours(line.to_string())))?;

    let minutes = u8::from_str(column(line, 17, 19)?.trim())
        .or(Err(ParsingError::EpochMinutes(line.to_string())))?;

    let seconds = u8::from_str(column(line, 20, 22)?.trim())
        .or(Err(ParsingError::EpochSeconds(line.to_string())))?;

    let epoch = Epoch::maybe_from_gregorian(
        year,
        month,
        day,
        hours,
        minutes,
        seconds,
        0,
        TimeScale::UTC,
    )
    .or(Err(ParsingError::Epoch))?;

    Ok(epoch.to_unix_seconds().round() as i64)
}

/// One decoded position record: vehicle identity and ECEF
/// coordinates in kilometers, as the product publishes them.
pub struct PositionLine {
    pub sv: SV,
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
}

impl FromStr for PositionLine {
    type Err = ParsingError;
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let sv = SV::from_str(column(line, 1, 4)?.trim())
            .or(Err(ParsingError::Vehicle(line[1..4.min(line.len())].to_string())))?;

        let x_km = f64::from_str(column(line, 4, 18)?.trim())
            .or(Err(ParsingError::Coordinates(line.to_string())))?;

        let y_km = f64::from_str(column(line, 18, 32)?.trim())
            .or(Err(ParsingError::Coordinates(line.to_string())))?;

        let z_km = f64::from_str(column(line, 32, 46)?.trim())
            .or(Err(ParsingError::Coordinates(line.to_string())))?;

        Ok(Self { sv, x_km, y_km, z_km })
    }
}
