mod height_estimation;
mod orbit_cache;

use log::LevelFilter;
use std::sync::Once;

use crate::prelude::*;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Renders an SP3 text body from (calendar epoch, records) tuples.
pub fn sp3_body(epochs: &[((i32, u8, u8, u8, u8, u8), Vec<(&str, f64, f64, f64)>)]) -> String {
    let mut body = String::new();
    for ((y, mo, d, h, mi, s), records) in epochs {
        body.push_str(&format!(
            "*  {:4} {:>2} {:>2} {:>2} {:>2} {:>2}\n",
            y, mo, d, h, mi, s
        ));
        for (sv, x, y_km, z) in records {
            body.push_str(&format!("P{}{:14.6}{:14.6}{:14.6}\n", sv, x, y_km, z));
        }
    }
    body.push_str("EOF\n");
    body
}

/// Synthetic ephemeris set with pre-attached look angles, for
/// exercising the window detector with full control over geometry.
pub fn synthetic_set(
    samples: &[(&str, i64, Option<LookAngle>)],
    frame: Frame,
) -> EphemerisSet {
    use crate::ephemeris::TrackSample;
    use std::str::FromStr;

    let mut set = crate::ephemeris::EphemerisSet::new(frame);
    for (sv, epoch, look) in samples {
        let sv = SV::from_str(sv).unwrap();
        set.push_sample(
            sv,
            *epoch,
            TrackSample {
                position_km: Vector3::new(20000.0, 0.0, 0.0),
                look: *look,
            },
        );
    }
    set
}
