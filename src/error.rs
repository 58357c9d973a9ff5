use thiserror::Error;

use crate::prelude::SV;

pub use crate::ephemeris::ParsingError;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed ephemeris content. Individual record lines are
    /// recoverable (skipped by the file parser), this is only
    /// returned when the file as a whole cannot be interpreted.
    #[error("ephemeris parsing error: {0}")]
    Parsing(#[from] ParsingError),

    /// Interpolation requested prior to the first sample of a track:
    /// the bracketing segment overlaps the previous UTC day, which
    /// we do not stitch across data sources.
    #[error("position interpolation is not implemented for segments overlapping midnight before")]
    MidnightSegmentBefore,

    /// Interpolation requested past the last sample of a track:
    /// the bracketing segment overlaps the next UTC day.
    #[error("position interpolation is not implemented for segments overlapping midnight after")]
    MidnightSegmentAfter,

    /// Requested vehicle does not exist in the ephemeris set
    /// serving this epoch.
    #[error("no ephemeris for {0}")]
    UnknownVehicle(SV),

    /// The archive answered 404: the daily product for this day has
    /// not been published yet. Non retryable until the next
    /// scheduled attempt.
    #[error("orbit product not published yet")]
    NotYetPublished,

    /// Failed to reach the orbit archive.
    #[error("orbit archive unreachable: {0}")]
    Network(String),

    /// Fetched product could not be decompressed or stored. Any
    /// partially written destination file has been removed.
    #[error("corrupt orbit product: {0}")]
    CorruptProduct(String),

    /// Ultra-rapid product was never fetched and no daily product
    /// covers the query.
    #[error("no orbit product loaded")]
    NoProductLoaded,

    /// Station observation frame does not follow the wire layout.
    /// The frame is discarded, the link is kept.
    #[error("malformed observation frame")]
    MalformedFrame,

    /// Meteorological payload shorter than the fixed 16 byte record.
    #[error("malformed meteo payload")]
    MalformedMeteoPayload,

    /// No frequency is defined for this (vehicle, signal id) pair.
    #[error("unknown carrier frequency for {0} signal {1}")]
    UnknownCarrierFrequency(SV, u8),

    #[error("unknown station #{0}")]
    UnknownStation(u16),

    #[error("unknown constellation name \"{0}\"")]
    UnknownConstellation(String),

    #[error("file i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
