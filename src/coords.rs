use std::f64::consts::PI;

use map_3d::{ecef2aer, Ellipsoid};
use nalgebra::Vector3;

/// Coordinate frame a [Position] is expressed in.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Earth-Centered Inertial (non rotating)
    #[default]
    Eci,
    /// Earth-Centered Earth-Fixed (rotates with Earth)
    Ecef,
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Eci => f.write_str("ECI"),
            Self::Ecef => f.write_str("ECEF"),
        }
    }
}

/// 3D coordinates in kilometers, tagged with the [Frame] they are
/// expressed in. Never implicitly rescaled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Position {
    pub km: Vector3<f64>,
    pub frame: Frame,
}

impl Position {
    pub fn new(km: Vector3<f64>, frame: Frame) -> Self {
        Self { km, frame }
    }
}

/// Azimuth and elevation of a vehicle as seen from one observer,
/// both in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LookAngle {
    pub azimuth: f64,
    pub elevation: f64,
}

/// Greenwich Mean Sidereal Time [rad] at given UNIX instant,
/// IAU-82 polynomial over UT1 centuries (UT1 ~ UTC here).
pub fn gmst(unix_seconds: i64) -> f64 {
    let jd = unix_seconds as f64 / 86400.0 + 2440587.5;
    let tut1 = (jd - 2451545.0) / 36525.0;

    // seconds of sidereal time
    let theta_s = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * tut1
        + 0.093104 * tut1 * tut1
        - 6.2e-6 * tut1 * tut1 * tut1;

    let theta = (theta_s % 86400.0) * PI / 43200.0;
    theta.rem_euclid(2.0 * PI)
}

/// Rotates Earth-fixed coordinates into the inertial frame,
/// using the sidereal angle of the epoch they were sampled at.
pub fn ecef_to_eci(ecef_km: &Vector3<f64>, gmst_rad: f64) -> Vector3<f64> {
    let (sin_g, cos_g) = gmst_rad.sin_cos();
    Vector3::new(
        cos_g * ecef_km.x - sin_g * ecef_km.y,
        sin_g * ecef_km.x + cos_g * ecef_km.y,
        ecef_km.z,
    )
}

/// Topocentric horizon transform: [LookAngle] of an ECEF position as
/// seen from a geodetic observer (latitude/longitude in radians,
/// height in kilometers above the WGS84 ellipsoid).
pub fn ecef_look_angle(
    ecef_km: &Vector3<f64>,
    latitude_rad: f64,
    longitude_rad: f64,
    height_km: f64,
) -> LookAngle {
    let (azimuth, elevation, _range) = ecef2aer(
        ecef_km.x * 1.0E3,
        ecef_km.y * 1.0E3,
        ecef_km.z * 1.0E3,
        latitude_rad,
        longitude_rad,
        height_km * 1.0E3,
        Ellipsoid::WGS84,
    );
    LookAngle { azimuth, elevation }
}
