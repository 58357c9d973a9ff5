//! Station descriptors: where a receiver sits, which part of the sky
//! it accepts, and how it wants its observation windows shaped.
use std::collections::BTreeMap;
use std::path::Path;

use nalgebra::Vector3;
use serde::Deserialize;

use crate::{
    coords::{ecef_look_angle, LookAngle},
    error::Error,
    prelude::Constellation,
};

fn default_min_sat_cnt() -> usize {
    3
}

fn default_min_window_secs() -> i64 {
    600
}

fn default_height_min_m() -> f64 {
    0.5
}

fn default_height_max_m() -> f64 {
    10.0
}

/// Angular admission gate [rad]. `min > max` wraps through zero
/// (a north-crossing azimuth sector).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AngleGate {
    pub min_rad: f64,
    pub max_rad: f64,
}

impl AngleGate {
    pub fn from_degrees(min_deg: f64, max_deg: f64) -> Self {
        Self {
            min_rad: min_deg.to_radians(),
            max_rad: max_deg.to_radians(),
        }
    }

    /// True when `angle` lies inside the gate (exclusive bounds).
    pub fn contains(&self, angle: f64) -> bool {
        if self.min_rad < self.max_rad {
            self.min_rad < angle && angle < self.max_rad
        } else {
            self.min_rad < angle || angle < self.max_rad
        }
    }
}

/// Reflector height search bounds [m], for the periodogram grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeightSearch {
    pub min_m: f64,
    pub max_m: f64,
}

impl Default for HeightSearch {
    fn default() -> Self {
        Self {
            min_m: default_height_min_m(),
            max_m: default_height_max_m(),
        }
    }
}

/// One receiving station: geodetic position, sky admission gates and
/// windowing / height search parameters. Built once from static
/// configuration, read-only during operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    /// Station identifier, as used on the wire and in log file names.
    pub id: u16,
    /// Geodetic latitude [rad]
    pub latitude_rad: f64,
    /// Geodetic longitude [rad]
    pub longitude_rad: f64,
    /// Height above the WGS84 ellipsoid [km]
    pub height_km: f64,
    /// Azimuth admission gate
    pub azimuth_gate: AngleGate,
    /// Elevation admission gate
    pub elevation_gate: AngleGate,
    /// Only admit epochs where the vehicle elevation is decreasing
    pub descending_only: bool,
    /// Minimum simultaneously visible vehicles to open a window
    pub min_sat_cnt_in_window: usize,
    /// Minimum common visibility duration [s]
    pub min_common_window_secs: i64,
    /// Constellation allow-list, all admitted when None
    pub constellations: Option<Vec<Constellation>>,
    /// Reflector height search bounds
    pub height_search: HeightSearch,
}

impl Observer {
    /// New station at given geodetic coordinates (degrees, meters),
    /// with a fully open sky and default windowing parameters.
    pub fn new(id: u16, latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Self {
        Self {
            id,
            latitude_rad: latitude_deg.to_radians(),
            longitude_rad: longitude_deg.to_radians(),
            height_km: height_m / 1000.0,
            azimuth_gate: AngleGate::from_degrees(0.0, 360.0),
            elevation_gate: AngleGate::from_degrees(0.0, 90.0),
            descending_only: false,
            min_sat_cnt_in_window: default_min_sat_cnt(),
            min_common_window_secs: default_min_window_secs(),
            constellations: None,
            height_search: HeightSearch::default(),
        }
    }

    pub fn with_azimuth_gate_deg(&self, min_deg: f64, max_deg: f64) -> Self {
        let mut s = self.clone();
        s.azimuth_gate = AngleGate::from_degrees(min_deg, max_deg);
        s
    }

    pub fn with_elevation_gate_deg(&self, min_deg: f64, max_deg: f64) -> Self {
        let mut s = self.clone();
        s.elevation_gate = AngleGate::from_degrees(min_deg, max_deg);
        s
    }

    pub fn with_descending_only(&self, descending_only: bool) -> Self {
        let mut s = self.clone();
        s.descending_only = descending_only;
        s
    }

    pub fn with_min_sat_cnt(&self, count: usize) -> Self {
        let mut s = self.clone();
        s.min_sat_cnt_in_window = count;
        s
    }

    pub fn with_min_common_window_secs(&self, seconds: i64) -> Self {
        let mut s = self.clone();
        s.min_common_window_secs = seconds;
        s
    }

    pub fn with_constellations(&self, constellations: Vec<Constellation>) -> Self {
        let mut s = self.clone();
        s.constellations = Some(constellations);
        s
    }

    pub fn with_height_search_m(&self, min_m: f64, max_m: f64) -> Self {
        let mut s = self.clone();
        s.height_search = HeightSearch { min_m, max_m };
        s
    }

    /// True when this station observes the given constellation.
    pub fn admits_constellation(&self, constellation: Constellation) -> bool {
        match &self.constellations {
            Some(list) => list.contains(&constellation),
            None => true,
        }
    }

    /// True when a look angle passes both admission gates.
    pub fn admits(&self, look: &LookAngle) -> bool {
        self.azimuth_gate.contains(look.azimuth) && self.elevation_gate.contains(look.elevation)
    }

    /// [LookAngle] of an ECEF position (km) as seen from this station.
    pub fn look_angle(&self, ecef_km: &Vector3<f64>) -> LookAngle {
        ecef_look_angle(ecef_km, self.latitude_rad, self.longitude_rad, self.height_km)
    }
}

/// On-disk station entry; angles and height in the units surveyors
/// report them in (degrees, meters).
#[derive(Debug, Clone, Deserialize)]
struct StationEntry {
    id: u16,
    latitude_deg: f64,
    longitude_deg: f64,
    height_m: f64,
    azimuth_gate_deg: (f64, f64),
    elevation_gate_deg: (f64, f64),
    #[serde(default)]
    descending_only: bool,
    #[serde(default = "default_min_sat_cnt")]
    min_sat_cnt_in_window: usize,
    #[serde(default = "default_min_window_secs")]
    min_common_window_secs: i64,
    #[serde(default)]
    constellations: Option<Vec<String>>,
    #[serde(default = "default_height_min_m")]
    height_search_min_m: f64,
    #[serde(default = "default_height_max_m")]
    height_search_max_m: f64,
}

impl StationEntry {
    fn into_observer(self) -> Result<Observer, Error> {
        use std::str::FromStr;

        let constellations = match self.constellations {
            Some(names) => {
                let mut list = Vec::with_capacity(names.len());
                for name in &names {
                    let c = Constellation::from_str(name)
                        .map_err(|_| Error::UnknownConstellation(name.clone()))?;
                    list.push(c);
                }
                Some(list)
            },
            None => None,
        };

        Ok(Observer {
            id: self.id,
            latitude_rad: self.latitude_deg.to_radians(),
            longitude_rad: self.longitude_deg.to_radians(),
            height_km: self.height_m / 1000.0,
            azimuth_gate: AngleGate::from_degrees(self.azimuth_gate_deg.0, self.azimuth_gate_deg.1),
            elevation_gate: AngleGate::from_degrees(
                self.elevation_gate_deg.0,
                self.elevation_gate_deg.1,
            ),
            descending_only: self.descending_only,
            min_sat_cnt_in_window: self.min_sat_cnt_in_window,
            min_common_window_secs: self.min_common_window_secs,
            constellations,
            height_search: HeightSearch {
                min_m: self.height_search_min_m,
                max_m: self.height_search_max_m,
            },
        })
    }
}

/// Loads the station table from a JSON array, keyed by station id.
pub fn load_stations<P: AsRef<Path>>(path: P) -> Result<BTreeMap<u16, Observer>, Error> {
    let content = std::fs::read_to_string(path)?;
    parse_stations(&content)
}

/// See [load_stations].
pub fn parse_stations(content: &str) -> Result<BTreeMap<u16, Observer>, Error> {
    let entries: Vec<StationEntry> = serde_json::from_str(content)?;
    let mut stations = BTreeMap::new();
    for entry in entries {
        let observer = entry.into_observer()?;
        stations.insert(observer.id, observer);
    }
    Ok(stations)
}
