//! Per-epoch position lookup on a sparse track.
use nalgebra::Vector3;

use crate::{ephemeris::SatelliteTrack, error::Error, math::lerp};

impl SatelliteTrack {
    /// Position at `t`, in kilometers. An exact sample is returned
    /// verbatim; otherwise the bracketing pair is blended linearly
    /// with weight `a = (t - before) / (after - before)`.
    ///
    /// Queries outside the track coverage would require stitching
    /// across a product boundary (the segment overlaps UTC midnight)
    /// and return the corresponding typed error instead of a guess.
    pub fn position_km_at(&self, t: i64) -> Result<Vector3<f64>, Error> {
        let (after_t, after) = self
            .samples
            .range(t..)
            .next()
            .ok_or(Error::MidnightSegmentAfter)?;

        if *after_t == t {
            return Ok(after.position_km);
        }

        let (before_t, before) = self
            .samples
            .range(..t)
            .next_back()
            .ok_or(Error::MidnightSegmentBefore)?;

        let a = (t - before_t) as f64 / (after_t - before_t) as f64;

        Ok(Vector3::new(
            lerp(before.position_km.x, after.position_km.x, a),
            lerp(before.position_km.y, after.position_km.y, a),
            lerp(before.position_km.z, after.position_km.z, a),
        ))
    }
}
