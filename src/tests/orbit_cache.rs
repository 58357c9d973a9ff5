use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::prelude::*;
use crate::tests::{init_logger, sp3_body};

/// Canned product source: serves fixed SP3 bodies and counts fetches.
struct CannedSource {
    final_body: String,
    ultra_body: String,
    final_fetches: AtomicUsize,
    ultra_fetches: AtomicUsize,
    publish_delay: Option<Duration>,
    published: bool,
}

impl CannedSource {
    fn new(final_body: String, ultra_body: String) -> Self {
        Self {
            final_body,
            ultra_body,
            final_fetches: AtomicUsize::new(0),
            ultra_fetches: AtomicUsize::new(0),
            publish_delay: None,
            published: true,
        }
    }

    fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.publish_delay = Some(delay);
        self
    }
}

impl ProductSource for CannedSource {
    fn fetch_final(&self, _year: i32, _day_of_year: u16) -> Result<Vec<u8>, Error> {
        self.final_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.publish_delay {
            std::thread::sleep(delay);
        }
        if !self.published {
            return Err(Error::NotYetPublished);
        }
        Ok(self.final_body.clone().into_bytes())
    }

    fn fetch_ultra_rapid(&self) -> Result<Vec<u8>, Error> {
        self.ultra_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.ultra_body.clone().into_bytes())
    }
}

/// Final product of 2024-01-15: G01 and E13 at 5 minute sampling.
fn final_body() -> String {
    sp3_body(&[
        (
            (2024, 1, 15, 0, 0, 0),
            vec![
                ("G01", 12345.123456, -6789.654321, 100.0),
                ("E13", 10000.0, 20000.0, 3000.0),
            ],
        ),
        (
            (2024, 1, 15, 0, 5, 0),
            vec![
                ("G01", 12355.123456, -6799.654321, 200.0),
                ("E13", 10010.0, 20010.0, 3010.0),
            ],
        ),
        (
            (2024, 1, 15, 0, 10, 0),
            vec![
                ("G01", 12365.123456, -6809.654321, 300.0),
                ("E13", 10020.0, 20020.0, 3020.0),
            ],
        ),
    ])
}

/// Ultra-rapid body covering 2024-02-01T00:00 .. 00:30.
fn ultra_body() -> String {
    sp3_body(&[
        ((2024, 2, 1, 0, 0, 0), vec![("G01", 20000.0, 0.0, 0.0)]),
        ((2024, 2, 1, 0, 15, 0), vec![("G01", 20000.0, 300.0, 100.0)]),
        ((2024, 2, 1, 0, 30, 0), vec![("G01", 20000.0, 600.0, 200.0)]),
    ])
}

const T0: i64 = 1705276800; // 2024-01-15T00:00:00Z
const U0: i64 = 1706745600; // 2024-02-01T00:00:00Z

#[test]
fn exact_epoch_round_trips_through_the_cache() {
    init_logger();

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()));
    let g01 = SV::from_str("G01").unwrap();

    let position = cache.position_at(g01, T0).unwrap();
    assert_eq!(position.frame, Frame::Ecef);
    assert_eq!(
        position.km,
        Vector3::new(12345.123456, -6789.654321, 100.0)
    );
}

#[test]
fn one_fetch_serves_a_whole_day() {
    init_logger();

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()));
    let g01 = SV::from_str("G01").unwrap();
    let e13 = SV::from_str("E13").unwrap();

    cache.position_at(g01, T0).unwrap();
    cache.position_at(e13, T0 + 150).unwrap();
    cache.position_at(g01, T0 + 600).unwrap();

    let fetches = {
        let source: &CannedSource = cache_source(&cache);
        source.final_fetches.load(Ordering::SeqCst)
    };
    assert_eq!(fetches, 1);
}

#[test]
fn interpolation_blends_between_product_samples() {
    init_logger();

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()));
    let g01 = SV::from_str("G01").unwrap();

    // halfway through the first 5 minute interval
    let position = cache.position_at(g01, T0 + 150).unwrap();
    assert!((position.km.x - 12350.123456).abs() < 1e-9);
    assert!((position.km.y + 6794.654321).abs() < 1e-9);
    assert!((position.km.z - 150.0).abs() < 1e-9);
}

#[test]
fn queries_outside_coverage_surface_midnight_errors() {
    init_logger();

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()));
    let g01 = SV::from_str("G01").unwrap();

    assert!(matches!(
        cache.position_at(g01, T0 - 10),
        Err(Error::MidnightSegmentBefore)
    ));
    assert!(matches!(
        cache.position_at(g01, T0 + 3600),
        Err(Error::MidnightSegmentAfter)
    ));

    let r01 = SV::from_str("R01").unwrap();
    assert!(matches!(
        cache.position_at(r01, T0),
        Err(Error::UnknownVehicle(_))
    ));
}

#[test]
fn ultra_rapid_preempts_daily_products() {
    init_logger();

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()));
    let g01 = SV::from_str("G01").unwrap();

    cache.reparse_ultra_rapid().unwrap();

    // strictly inside the rolling range: no daily fetch at all
    let position = cache.position_at(g01, U0 + 450).unwrap();
    assert!((position.km.y - 150.0).abs() < 1e-9);

    let source = cache_source(&cache);
    assert_eq!(source.final_fetches.load(Ordering::SeqCst), 0);
    assert_eq!(source.ultra_fetches.load(Ordering::SeqCst), 1);

    // range bounds are exclusive: the edge epochs fall back to the
    // daily product of that day (not cached here, hence a fetch)
    let _ = cache.position_at(g01, U0);
    assert_eq!(source.final_fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn unpublished_products_are_a_distinct_failure() {
    init_logger();

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()).unpublished());
    let g01 = SV::from_str("G01").unwrap();

    assert!(matches!(
        cache.position_at(g01, T0),
        Err(Error::NotYetPublished)
    ));

    // failures are not cached: the next query tries again
    assert!(matches!(
        cache.position_at(g01, T0),
        Err(Error::NotYetPublished)
    ));
    let source = cache_source(&cache);
    assert_eq!(source.final_fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_queries_share_one_fetch() {
    init_logger();

    let cache = OrbitCache::new(
        CannedSource::new(final_body(), ultra_body()).slow(Duration::from_millis(100)),
    );
    let g01 = SV::from_str("G01").unwrap();

    std::thread::scope(|scope| {
        for worker in 0..8_i64 {
            let cache = &cache;
            scope.spawn(move || {
                let position = cache.position_at(g01, T0 + (worker % 3) * 60).unwrap();
                assert_eq!(position.frame, Frame::Ecef);
            });
        }
    });

    let source = cache_source(&cache);
    assert_eq!(source.final_fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn windows_run_against_the_rolling_product() {
    init_logger();

    // wide open station: a single vehicle in view qualifies,
    // whatever sign convention its azimuth comes out with
    let observer = Observer::new(9, 47.0, 19.0, 110.0)
        .with_azimuth_gate_deg(-360.0, 360.0)
        .with_elevation_gate_deg(-90.0, 90.0)
        .with_min_sat_cnt(1)
        .with_min_common_window_secs(600);

    let cache = OrbitCache::new(CannedSource::new(final_body(), ultra_body()));
    let windows = cache.windows_for(&observer, false).unwrap();

    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    assert_eq!(window.from_epoch, U0 - Constants::WINDOW_MARGIN_SECS);
    assert_eq!(window.to_epoch, U0 + 1800 + Constants::WINDOW_MARGIN_SECS);
    assert!(window.sat_ids.contains(&SV::from_str("G01").unwrap()));

    // the query pulled the rolling product on demand, exactly once
    let source = cache_source(&cache);
    assert_eq!(source.ultra_fetches.load(Ordering::SeqCst), 1);
}

/// The cache owns its source; tests reach it through a reference.
fn cache_source<S: ProductSource>(cache: &OrbitCache<S>) -> &S {
    cache.source()
}
