//! SP3 ephemeris subset parser and the per-vehicle position tables
//! it produces.
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;
use log::debug;
use nalgebra::Vector3;

use crate::{
    cfg::Observer,
    coords::{ecef_to_eci, gmst, Frame, LookAngle, Position},
    error::Error,
    prelude::{Constellation, SV},
};

mod parsing;

pub use parsing::{is_epoch_line, is_position_line, parse_epoch_line, ParsingError, PositionLine};

/// One ephemeris sample: coordinates in kilometers (frame tagged at
/// the [EphemerisSet] level) and the look angle when the parse was
/// given an observer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackSample {
    pub position_km: Vector3<f64>,
    pub look: Option<LookAngle>,
}

/// Epoch ordered position samples of one vehicle. Epochs are UNIX
/// seconds, strictly increasing by construction.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SatelliteTrack {
    pub(crate) samples: BTreeMap<i64, TrackSample>,
}

impl SatelliteTrack {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates (epoch, sample) in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &TrackSample)> + '_ {
        self.samples.iter().map(|(t, sample)| (*t, sample))
    }

    pub fn first_epoch(&self) -> Option<i64> {
        self.samples.keys().next().copied()
    }

    pub fn last_epoch(&self) -> Option<i64> {
        self.samples.keys().next_back().copied()
    }

    /// Sample recorded exactly at `t`, if any.
    pub fn sample_at(&self, t: i64) -> Option<&TrackSample> {
        self.samples.get(&t)
    }
}

/// Output of one SP3 parse: per constellation, per vehicle position
/// tables, all expressed in one [Frame]. A new parse produces a new
/// set, existing sets are never mutated.
#[derive(Debug, Clone)]
pub struct EphemerisSet {
    /// [Frame] all positions are expressed in.
    pub frame: Frame,
    tracks: BTreeMap<Constellation, BTreeMap<SV, SatelliteTrack>>,
}

impl EphemerisSet {
    pub(crate) fn new(frame: Frame) -> Self {
        Self {
            frame,
            tracks: BTreeMap::new(),
        }
    }

    pub(crate) fn push_sample(&mut self, sv: SV, epoch: i64, sample: TrackSample) {
        self.tracks
            .entry(sv.constellation)
            .or_default()
            .entry(sv)
            .or_default()
            .samples
            .insert(epoch, sample);
    }

    /// Parses one SP3 text body. Epoch lines update the binding
    /// timestamp (and its sidereal angle, used only for the frame
    /// rotation); position records attach to the most recent epoch
    /// line. Malformed record lines are skipped individually: files
    /// may be truncated by a concurrent download.
    ///
    /// Positions are natively Earth-fixed. Requesting [Frame::Eci]
    /// rotates them by the epoch sidereal angle. With an observer,
    /// each sample is annotated with its [LookAngle] (computed from
    /// the Earth-fixed coordinates, before any rotation).
    pub fn parse(content: &str, observer: Option<&Observer>, frame: Frame) -> Self {
        let mut set = Self::new(frame);
        let mut current: Option<(i64, f64)> = None;

        for line in content.lines() {
            if is_epoch_line(line) {
                match parse_epoch_line(line) {
                    Ok(t) => current = Some((t, gmst(t))),
                    Err(e) => debug!("skipping malformed epoch line: {}", e),
                }
            } else if is_position_line(line) {
                let Some((epoch, theta)) = current else {
                    debug!("skipping position record with no preceding epoch line");
                    continue;
                };
                match PositionLine::from_str(line) {
                    Ok(entry) => {
                        let ecef = Vector3::new(entry.x_km, entry.y_km, entry.z_km);
                        let look = observer.map(|obs| obs.look_angle(&ecef));
                        let position_km = match frame {
                            Frame::Ecef => ecef,
                            Frame::Eci => ecef_to_eci(&ecef, theta),
                        };
                        set.push_sample(entry.sv, epoch, TrackSample { position_km, look });
                    },
                    Err(e) => debug!("skipping malformed position record: {}", e),
                }
            }
            // all other line types ignored
        }
        set
    }

    /// Parses an SP3 file from disk, see [Self::parse].
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        observer: Option<&Observer>,
        frame: Frame,
    ) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content, observer, frame))
    }

    /// Iterates all (vehicle, track) pairs, grouped by constellation,
    /// in a deterministic order.
    pub fn satellites(&self) -> impl Iterator<Item = (SV, &SatelliteTrack)> + '_ {
        self.tracks
            .values()
            .flat_map(|sats| sats.iter().map(|(sv, track)| (*sv, track)))
    }

    /// Unique constellations present in this set.
    pub fn constellations(&self) -> impl Iterator<Item = Constellation> + '_ {
        self.satellites().map(|(sv, _)| sv.constellation).unique()
    }

    pub fn track(&self, sv: SV) -> Option<&SatelliteTrack> {
        self.tracks.get(&sv.constellation)?.get(&sv)
    }

    pub fn nb_satellites(&self) -> usize {
        self.tracks.values().map(|sats| sats.len()).sum()
    }

    /// Earliest epoch any vehicle is described at.
    pub fn first_epoch(&self) -> Option<i64> {
        self.satellites().filter_map(|(_, t)| t.first_epoch()).min()
    }

    /// Latest epoch any vehicle is described at.
    pub fn last_epoch(&self) -> Option<i64> {
        self.satellites().filter_map(|(_, t)| t.last_epoch()).max()
    }

    /// True when `t` lies strictly inside this set's epoch range.
    pub fn covers(&self, t: i64) -> bool {
        match (self.first_epoch(), self.last_epoch()) {
            (Some(first), Some(last)) => first < t && t < last,
            _ => false,
        }
    }

    /// Exact or linearly interpolated position of `sv` at `t`,
    /// tagged with this set's [Frame].
    pub fn position_at(&self, sv: SV, t: i64) -> Result<Position, Error> {
        let track = self.track(sv).ok_or(Error::UnknownVehicle(sv))?;
        let km = track.position_km_at(t)?;
        Ok(Position::new(km, self.frame))
    }
}
