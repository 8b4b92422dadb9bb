use serde::{Deserialize, Serialize};

/// A location reading exactly as the sensor produced it
///
/// The timestamp is monotonic-since-boot and only meaningful relative to the
/// clock that stamped it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Monotonic timestamp in nanoseconds
    pub monotonic_timestamp_ns: u64,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy: f32,
    /// Ground speed in m/s
    pub speed: f32,
    /// Bearing in degrees
    pub bearing: f32,
}

/// A location reading with its timestamp moved to UTC nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciledSample {
    /// UTC timestamp in nanoseconds since the Unix epoch
    pub utc_timestamp_ns: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f32,
    pub speed: f32,
    pub bearing: f32,
}

impl ReconciledSample {
    /// Render the sample as one session log line (without the newline)
    pub fn to_log_line(&self) -> String {
        format!(
            "{},{},{}",
            self.utc_timestamp_ns, self.latitude, self.longitude
        )
    }
}
