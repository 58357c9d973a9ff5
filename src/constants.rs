pub struct Constants;

impl Constants {
    /// Speed of light [m/s]
    pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

    /// Settle time added on both ends of an accepted observation window [s]
    pub const WINDOW_MARGIN_SECS: i64 = 300;

    /// Minimum number of usable SNR samples for one satellite
    /// to contribute a height measurement
    pub const MIN_SNR_SAMPLES: usize = 250;

    /// Height search grid resolution [m]
    pub const HEIGHT_GRID_STEP_M: f64 = 0.01;

    /// Sampling interval of the daily (final) orbit product [s]
    pub const FINAL_PRODUCT_INTERVAL_SECS: i64 = 300;

    /// Sampling interval of the ultra-rapid orbit product [s]
    pub const ULTRA_RAPID_INTERVAL_SECS: i64 = 900;
}
