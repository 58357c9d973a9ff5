//! Session logs: the human inspectable persisted form of decoded
//! observation frames, and their replay into the SNR series the
//! height estimation consumes.
//!
//! One segment per report tick, `|` delimited:
//! `<unix-seconds>;<sv>/<signal>=<snr>,...|`
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    cfg::Observer,
    error::Error,
    orbit::{OrbitCache, ProductSource},
    prelude::SV,
    telemetry::ObservationRecord,
};

/// One vehicle on one signal: the unit a height measurement is
/// attributed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SatSignal {
    pub sv: SV,
    pub signal_id: u8,
}

impl std::fmt::Display for SatSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.sv, self.signal_id)
    }
}

impl FromStr for SatSignal {
    type Err = Error;
    /// Parses `G01/0`; a missing `/signal` suffix means signal id 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sv_part, signal_part) = match s.split_once('/') {
            Some((sv, signal)) => (sv, Some(signal)),
            None => (s, None),
        };
        let sv = SV::from_str(sv_part.trim()).map_err(|_| Error::MalformedFrame)?;
        let signal_id = match signal_part {
            Some(raw) => u8::from_str(raw.trim()).map_err(|_| Error::MalformedFrame)?,
            None => 0,
        };
        Ok(Self { sv, signal_id })
    }
}

/// One decoded SNR observation with its viewing geometry attached.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SnrSample {
    /// Report time [UNIX s]
    pub time: i64,
    /// Azimuth of the vehicle at report time [rad]
    pub azimuth: f64,
    /// Elevation of the vehicle at report time [rad]
    pub elevation: f64,
    /// Reported carrier to noise density [dB-Hz]
    pub snr: f64,
}

/// Serializes one decoded frame as a log segment.
pub fn format_segment(timestamp: i64, records: &[ObservationRecord]) -> String {
    let mut segment = format!("{};", timestamp);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            segment.push(',');
        }
        segment.push_str(&format!(
            "{}/{}={}",
            record.sv, record.signal_id, record.snr
        ));
    }
    segment.push('|');
    segment
}

/// Appends one decoded frame to a session log writer.
pub fn append_frame<W: Write>(
    out: &mut W,
    timestamp: i64,
    records: &[ObservationRecord],
) -> Result<(), Error> {
    out.write_all(format_segment(timestamp, records).as_bytes())?;
    Ok(())
}

/// Parses a session log body into raw (time, snr) ticks per vehicle
/// and signal. Malformed segments are skipped with a warning, the
/// rest of the log is kept: logs may end mid segment when a station
/// loses power.
pub fn parse_log(content: &str) -> BTreeMap<SatSignal, Vec<(i64, u8)>> {
    let mut ticks = BTreeMap::<SatSignal, Vec<(i64, u8)>>::new();

    for segment in content.split('|') {
        if segment.is_empty() {
            continue;
        }

        let Some((time_part, data_part)) = segment.split_once(';') else {
            warn!("skipping segment without timestamp separator");
            continue;
        };

        let Ok(timestamp) = i64::from_str(time_part.trim()) else {
            warn!("skipping segment with invalid timestamp \"{}\"", time_part);
            continue;
        };

        for entry in data_part.split(',') {
            if entry.is_empty() {
                continue;
            }
            let Some((key_part, snr_part)) = entry.split_once('=') else {
                warn!("skipping entry without snr \"{}\"", entry);
                continue;
            };
            let Ok(key) = SatSignal::from_str(key_part) else {
                warn!("skipping entry with invalid vehicle \"{}\"", key_part);
                continue;
            };
            let Ok(snr) = u8::from_str(snr_part.trim()) else {
                warn!("skipping entry with invalid snr \"{}\"", snr_part);
                continue;
            };
            ticks.entry(key).or_default().push((timestamp, snr));
        }
    }

    ticks
}

/// Reads a session log file, see [parse_log].
pub fn read_log_file<P: AsRef<Path>>(path: P) -> Result<BTreeMap<SatSignal, Vec<(i64, u8)>>, Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_log(&content))
}

/// Attaches viewing geometry to raw log ticks: each vehicle position
/// is resolved through the orbit cache and projected onto the
/// station horizon. Ticks whose position cannot be resolved (product
/// not published, segment overlapping midnight) are skipped with a
/// warning; the remaining series keep their chronological order.
pub fn attach_look_angles<S: ProductSource>(
    ticks: &BTreeMap<SatSignal, Vec<(i64, u8)>>,
    cache: &OrbitCache<S>,
    observer: &Observer,
) -> BTreeMap<SatSignal, Vec<SnrSample>> {
    let mut series = BTreeMap::<SatSignal, Vec<SnrSample>>::new();

    for (key, raw) in ticks {
        let mut samples = Vec::with_capacity(raw.len());
        for &(time, snr) in raw {
            match cache.look_angle_at(key.sv, time, observer) {
                Ok(look) => samples.push(SnrSample {
                    time,
                    azimuth: look.azimuth,
                    elevation: look.elevation,
                    snr: snr as f64,
                }),
                Err(e) => {
                    warn!("dropping {} tick at {}: {}", key, time, e);
                },
            }
        }
        if !samples.is_empty() {
            series.insert(*key, samples);
        }
    }

    series
}
