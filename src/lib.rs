#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod carrier;
mod cfg;
mod constants;
mod coords;
mod ephemeris;
mod error;
mod height;
mod history;
mod interp;
mod math;
mod orbit;
mod session;
mod telemetry;
mod window;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::carrier::{glonass_channel, Carrier};
    pub use crate::cfg::{load_stations, parse_stations, AngleGate, HeightSearch, Observer};
    pub use crate::constants::Constants;
    pub use crate::coords::{ecef_look_angle, ecef_to_eci, gmst, Frame, LookAngle, Position};
    pub use crate::ephemeris::{
        is_epoch_line, is_position_line, parse_epoch_line, EphemerisSet, PositionLine,
        SatelliteTrack, TrackSample,
    };
    pub use crate::error::{Error, ParsingError};
    pub use crate::height::{estimate, Diagnostics, HeightMeasurement};
    pub use crate::history::{History, MeteoEntry};
    pub use crate::orbit::{day_key, CodArchive, DayKey, OrbitCache, ProductSource};
    pub use crate::session::{
        append_frame, attach_look_angles, format_segment, parse_log, read_log_file, SatSignal,
        SnrSample,
    };
    pub use crate::telemetry::{
        decode_meteo_payload, decode_observation_frame, encode_observation_frame, MeteoRecord,
        ObservationRecord,
    };
    pub use crate::window::{detect, ObservationWindow};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::Epoch;
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
