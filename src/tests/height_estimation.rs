use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::str::FromStr;

use crate::prelude::*;
use crate::tests::init_logger;

fn test_station() -> Observer {
    Observer::new(1, 47.029834, 18.110587, 108.0)
        .with_azimuth_gate_deg(110.0, 220.0)
        .with_elevation_gate_deg(0.0, 25.0)
        .with_height_search_m(0.5, 10.0)
}

/// SNR series of a reflector at `height_m`: direct-signal trend plus
/// the interference ripple in sin(elevation).
fn interference_series(height_m: f64, lambda: f64, count: usize) -> Vec<SnrSample> {
    let spatial_freq = 4.0 * PI * height_m / lambda;

    (0..count)
        .map(|i| {
            // elevation sweep 2..23 degrees, inside the gates
            let elevation = (2.0 + 21.0 * i as f64 / count as f64).to_radians();
            let sin_e = elevation.sin();
            let trend = 48.0 - 14.0 * sin_e + 6.0 * sin_e * sin_e;
            let ripple = 7.5 * (spatial_freq * sin_e).cos();
            SnrSample {
                time: 1000 + i as i64,
                azimuth: 180.0_f64.to_radians(),
                elevation,
                snr: trend + ripple,
            }
        })
        .collect()
}

#[test]
fn insufficient_samples_yield_no_measurement() {
    init_logger();

    let station = test_station();
    let key = SatSignal::from_str("G07/0").unwrap();
    let lambda = Carrier::L1.wavelength();

    // 249 valid samples: satellite omitted
    let mut series = BTreeMap::new();
    series.insert(key, interference_series(3.0, lambda, 249));
    assert!(estimate(&series, &station, false).is_empty());

    // one more sample: exactly one measurement
    let mut series = BTreeMap::new();
    series.insert(key, interference_series(3.0, lambda, 250));
    assert_eq!(estimate(&series, &station, false).len(), 1);
}

#[test]
fn synthetic_interference_recovers_height() {
    init_logger();

    let station = test_station();
    let key = SatSignal::from_str("G07/0").unwrap();
    let height_m = 3.57;
    let lambda = Carrier::L1.wavelength();

    let mut series = BTreeMap::new();
    series.insert(key, interference_series(height_m, lambda, 600));

    let measurements = estimate(&series, &station, false);
    assert_eq!(measurements.len(), 1);

    let measurement = &measurements[0];
    assert_eq!(measurement.sat, key);
    // within a few grid steps of the injected height
    assert!(
        (measurement.height_m - height_m).abs() <= 5.0 * Constants::HEIGHT_GRID_STEP_M,
        "estimated {} m, expected {} m",
        measurement.height_m,
        height_m
    );
    // reported at the latest sample time
    assert_eq!(measurement.time, 1000 + 599);
    assert!(measurement.diagnostics.is_none());
}

#[test]
fn glonass_series_use_fdma_wavelength() {
    init_logger();

    let station = test_station();
    // slot 10 transmits on channel -7
    let key = SatSignal::from_str("R10/0").unwrap();
    let lambda = Carrier::G1(-7).wavelength();
    let height_m = 2.25;

    let mut series = BTreeMap::new();
    series.insert(key, interference_series(height_m, lambda, 500));

    let measurements = estimate(&series, &station, false);
    assert_eq!(measurements.len(), 1);
    assert!((measurements[0].height_m - height_m).abs() <= 5.0 * Constants::HEIGHT_GRID_STEP_M);
}

#[test]
fn gated_and_non_finite_samples_are_discarded() {
    init_logger();

    let station = test_station();
    let key = SatSignal::from_str("G07/0").unwrap();
    let lambda = Carrier::L1.wavelength();

    // 250 valid samples, plus junk that must not count or crash
    let mut samples = interference_series(3.0, lambda, 250);
    for i in 0..50 {
        samples.push(SnrSample {
            time: 5000 + i,
            azimuth: 10.0_f64.to_radians(), // outside the azimuth gate
            elevation: 0.2,
            snr: 45.0,
        });
        samples.push(SnrSample {
            time: 6000 + i,
            azimuth: 180.0_f64.to_radians(),
            elevation: f64::NAN,
            snr: 45.0,
        });
    }

    let mut series = BTreeMap::new();
    series.insert(key, samples);

    let measurements = estimate(&series, &station, false);
    assert_eq!(measurements.len(), 1);
    // junk samples are later than every valid one and must not leak
    // into the reported time
    assert_eq!(measurements[0].time, 1000 + 249);
}

#[test]
fn diagnostics_expose_periodogram_internals() {
    init_logger();

    let station = test_station();
    let key = SatSignal::from_str("E11/0").unwrap();
    let lambda = Carrier::E1.wavelength();

    let mut series = BTreeMap::new();
    series.insert(key, interference_series(4.2, lambda, 400));

    let measurements = estimate(&series, &station, true);
    assert_eq!(measurements.len(), 1);

    let diagnostics = measurements[0].diagnostics.as_ref().unwrap();
    assert_eq!(diagnostics.frequencies.len(), diagnostics.amplitudes.len());
    assert_eq!(diagnostics.sin_elevation.len(), 400);
    assert_eq!(diagnostics.raw_snr.len(), 400);

    // the peak the estimate was read from is the grid maximum
    let scale = 4.0 * PI / lambda;
    let peak = measurements[0].height_m * scale;
    let (imax, _) = diagnostics
        .amplitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap();
    assert!((diagnostics.frequencies[imax] - peak).abs() < 1e-9);

    // detrend removed the slow direct-signal curve: the fitted
    // quadratic tracks the injected trend
    let (c0, c1, c2) = diagnostics.fit;
    assert!((c0 - 48.0).abs() < 1.5);
    assert!((c1 + 14.0).abs() < 8.0);
    let _ = c2;
}

#[test]
fn independent_vehicles_yield_independent_measurements() {
    init_logger();

    let station = test_station();
    let lambda = Carrier::L1.wavelength();

    let mut series = BTreeMap::new();
    series.insert(
        SatSignal::from_str("G07/0").unwrap(),
        interference_series(3.0, lambda, 400),
    );
    series.insert(
        SatSignal::from_str("G09/0").unwrap(),
        interference_series(5.5, lambda, 400),
    );
    // too thin to contribute
    series.insert(
        SatSignal::from_str("G11/0").unwrap(),
        interference_series(4.0, lambda, 100),
    );

    let mut measurements = estimate(&series, &station, false);
    measurements.sort_by_key(|m| m.sat);
    assert_eq!(measurements.len(), 2);
    assert!((measurements[0].height_m - 3.0).abs() <= 5.0 * Constants::HEIGHT_GRID_STEP_M);
    assert!((measurements[1].height_m - 5.5).abs() <= 5.0 * Constants::HEIGHT_GRID_STEP_M);
}
