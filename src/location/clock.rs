// Clock reconciliation
//
// Sensor timestamps live in the monotonic-since-boot domain. The session log
// wants UTC. A single (wall, monotonic) snapshot taken when a session starts
// gives the offset between the two; every sample of that session is shifted
// by the same offset so relative spacing survives wall-clock adjustments.

use chrono::Utc;
use std::time::Instant;

use super::sample::{RawSample, ReconciledSample};

/// Source of the two time domains the recorder reconciles
pub trait Clock: Send + Sync {
    /// Wall-clock time in nanoseconds since the Unix epoch
    fn wall_clock_now_ns(&self) -> i64;

    /// Monotonic time in nanoseconds, in the same domain sensor samples use
    fn monotonic_now_ns(&self) -> u64;
}

/// Process clock: chrono wall clock plus an `Instant` anchored at creation
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn wall_clock_now_ns(&self) -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }

    fn monotonic_now_ns(&self) -> u64 {
        u64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Both clock domains read back to back, once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub wall_clock_ns: i64,
    pub monotonic_ns: u64,
}

impl ClockSnapshot {
    pub fn capture(clock: &dyn Clock) -> Self {
        Self {
            wall_clock_ns: clock.wall_clock_now_ns(),
            monotonic_ns: clock.monotonic_now_ns(),
        }
    }

    /// `wall_clock_now_ns - monotonic_now_ns`
    pub fn offset_ns(&self) -> i64 {
        self.wall_clock_ns
            .saturating_sub(i64::try_from(self.monotonic_ns).unwrap_or(i64::MAX))
    }
}

/// Capture a fresh snapshot and return its offset
pub fn compute_offset(clock: &dyn Clock) -> i64 {
    ClockSnapshot::capture(clock).offset_ns()
}

/// Shift a raw sample into UTC using a session-fixed offset
pub fn reconcile(raw: RawSample, offset_ns: i64) -> ReconciledSample {
    ReconciledSample {
        utc_timestamp_ns: i64::try_from(raw.monotonic_timestamp_ns)
            .unwrap_or(i64::MAX)
            .saturating_add(offset_ns),
        latitude: raw.latitude,
        longitude: raw.longitude,
        altitude: raw.altitude,
        accuracy: raw.accuracy,
        speed: raw.speed,
        bearing: raw.bearing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock {
        wall: i64,
        mono: u64,
    }

    impl Clock for FixedClock {
        fn wall_clock_now_ns(&self) -> i64 {
            self.wall
        }

        fn monotonic_now_ns(&self) -> u64 {
            self.mono
        }
    }

    fn raw(ts: u64) -> RawSample {
        RawSample {
            monotonic_timestamp_ns: ts,
            latitude: 48.0,
            longitude: 11.0,
            altitude: 500.0,
            accuracy: 4.0,
            speed: 0.0,
            bearing: 0.0,
        }
    }

    #[test]
    fn offset_is_wall_minus_monotonic() {
        let clock = FixedClock {
            wall: 1_700_000_000_000_000_000,
            mono: 5_000_000_000,
        };

        assert_eq!(compute_offset(&clock), 1_699_999_995_000_000_000);
    }

    #[test]
    fn reconcile_preserves_order_and_spacing() {
        let offset = 1_699_999_995_000_000_000;
        let stamps = [5_000_000_000u64, 5_000_000_001, 6_250_000_000, 9_999_999_999];

        let reconciled: Vec<i64> = stamps
            .iter()
            .map(|&ts| reconcile(raw(ts), offset).utc_timestamp_ns)
            .collect();

        for (pair_raw, pair_utc) in stamps.windows(2).zip(reconciled.windows(2)) {
            assert_eq!(
                (pair_raw[1] - pair_raw[0]) as i64,
                pair_utc[1] - pair_utc[0],
                "spacing must be preserved exactly"
            );
        }
        assert_eq!(reconciled[0], 1_700_000_000_000_000_000);
    }

    #[test]
    fn reconcile_keeps_sensor_fields() {
        let sample = reconcile(raw(42), 8);

        assert_eq!(sample.utc_timestamp_ns, 50);
        assert_eq!(sample.latitude, 48.0);
        assert_eq!(sample.altitude, 500.0);
        assert_eq!(sample.accuracy, 4.0);
    }

    #[test]
    fn out_of_range_timestamps_saturate_instead_of_wrapping() {
        let snapshot = ClockSnapshot {
            wall_clock_ns: 0,
            monotonic_ns: u64::MAX,
        };
        assert_eq!(snapshot.offset_ns(), -i64::MAX);

        assert_eq!(reconcile(raw(u64::MAX), 0).utc_timestamp_ns, i64::MAX);
        assert_eq!(reconcile(raw(u64::MAX), 1).utc_timestamp_ns, i64::MAX);
        assert!(reconcile(raw(u64::MAX), -5).utc_timestamp_ns > 0);
    }

    #[test]
    fn system_clock_monotonic_never_goes_backwards() {
        let clock = SystemClock::new();
        let a = clock.monotonic_now_ns();
        let b = clock.monotonic_now_ns();
        assert!(b >= a);
    }
}
