//! SNR to reflector height: the interference pattern a water surface
//! imprints on low elevation SNR oscillates in sin(elevation) with a
//! spatial frequency proportional to the antenna height above the
//! reflector. The dominant periodogram peak is that height.
use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    carrier::Carrier,
    cfg::Observer,
    constants::Constants,
    math::{arange, lomb_scargle, quadratic_eval, quadratic_fit},
    session::{SatSignal, SnrSample},
};

/// Periodogram internals of one measurement, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Spatial frequency grid the periodogram was evaluated on
    pub frequencies: Vec<f64>,
    /// Normalized periodogram amplitudes, aligned with `frequencies`
    pub amplitudes: Vec<f64>,
    /// sin(elevation) of the surviving samples
    pub sin_elevation: Vec<f64>,
    /// SNR of the surviving samples, before detrending
    pub raw_snr: Vec<f64>,
    /// Quadratic detrend coefficients (c0, c1, c2)
    pub fit: (f64, f64, f64),
}

/// One reflector height estimate, attributed to the vehicle and
/// signal it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMeasurement {
    /// Latest report time of the contributing series [UNIX s]
    pub time: i64,
    /// Estimated reflector height [m]
    pub height_m: f64,
    /// Vehicle and signal the estimate came from
    pub sat: SatSignal,
    /// Periodogram internals, when requested
    pub diagnostics: Option<Diagnostics>,
}

fn estimate_one(
    key: &SatSignal,
    samples: &[SnrSample],
    station: &Observer,
    want_diagnostics: bool,
) -> Option<HeightMeasurement> {
    let usable: Vec<&SnrSample> = samples
        .iter()
        .filter(|s| s.elevation.is_finite() && s.snr.is_finite())
        .filter(|s| {
            station.azimuth_gate.contains(s.azimuth) && station.elevation_gate.contains(s.elevation)
        })
        .collect();

    if usable.len() < Constants::MIN_SNR_SAMPLES {
        debug!(
            "{}: {} usable samples, not enough statistical power",
            key,
            usable.len()
        );
        return None;
    }

    let lambda = match Carrier::from_signal_id(key.sv, key.signal_id) {
        Ok(carrier) => carrier.wavelength(),
        Err(e) => {
            debug!("{}: {}", key, e);
            return None;
        },
    };

    let sin_elevation: Vec<f64> = usable.iter().map(|s| s.elevation.sin()).collect();
    let raw_snr: Vec<f64> = usable.iter().map(|s| s.snr).collect();

    // height h maps to spatial frequency 4·pi·h / lambda
    let scale = 4.0 * PI / lambda;
    let frequencies = arange(
        scale * station.height_search.min_m,
        scale * station.height_search.max_m,
        scale * Constants::HEIGHT_GRID_STEP_M,
    );
    if frequencies.is_empty() {
        debug!("{}: empty height search grid", key);
        return None;
    }

    // remove the direct signal trend, keep the interference ripple
    let fit = quadratic_fit(&sin_elevation, &raw_snr);
    let detrended: Vec<f64> = sin_elevation
        .iter()
        .zip(raw_snr.iter())
        .map(|(&x, &y)| y - quadratic_eval(fit, x))
        .collect();

    let amplitudes = lomb_scargle(&sin_elevation, &detrended, &frequencies, true);

    let (peak_idx, _) = amplitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;

    let height_m = frequencies[peak_idx] * lambda / (4.0 * PI);
    let time = usable.iter().map(|s| s.time).max()?;

    let diagnostics = want_diagnostics.then(|| Diagnostics {
        frequencies,
        amplitudes,
        sin_elevation,
        raw_snr,
        fit,
    });

    Some(HeightMeasurement {
        time,
        height_m,
        sat: *key,
        diagnostics,
    })
}

/// Estimates the reflector height once per (vehicle, signal) series.
/// Series with fewer than 250 usable samples are omitted, not
/// errors. Vehicles are processed in parallel; the output keeps the
/// deterministic series order. No cross vehicle fusion happens here.
pub fn estimate(
    series: &BTreeMap<SatSignal, Vec<SnrSample>>,
    station: &Observer,
    want_diagnostics: bool,
) -> Vec<HeightMeasurement> {
    let entries: Vec<(&SatSignal, &Vec<SnrSample>)> = series.iter().collect();

    entries
        .par_iter()
        .filter_map(|(key, samples)| estimate_one(key, samples, station, want_diagnostics))
        .collect()
}
