use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use crate::location::{Clock, ClockSnapshot};

/// Identity of one Idle -> Recording -> Idle cycle
///
/// The clock snapshot is taken once; both the UTC offset applied to samples
/// and the log file name derive from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub clock: ClockSnapshot,
}

impl Session {
    pub fn begin(clock: &dyn Clock) -> Self {
        Self::from_snapshot(ClockSnapshot::capture(clock))
    }

    pub fn from_snapshot(clock: ClockSnapshot) -> Self {
        let secs = clock.wall_clock_ns.div_euclid(1_000_000_000);
        let nanos = clock.wall_clock_ns.rem_euclid(1_000_000_000) as u32;
        let started_at = DateTime::from_timestamp(secs, nanos).unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            started_at,
            clock,
        }
    }

    /// Offset turning this session's monotonic timestamps into UTC
    pub fn offset_ns(&self) -> i64 {
        self.clock.offset_ns()
    }

    /// `gps_<yyyyMMdd_HHmmss>` in local time, without extension
    pub fn log_file_stem(&self) -> String {
        format!(
            "gps_{}",
            self.started_at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_at_matches_snapshot_wall_clock() {
        let session = Session::from_snapshot(ClockSnapshot {
            wall_clock_ns: 1_700_000_000_500_000_000,
            monotonic_ns: 2_000_000_000,
        });

        assert_eq!(session.started_at.timestamp(), 1_700_000_000);
        assert_eq!(session.started_at.timestamp_subsec_nanos(), 500_000_000);
        assert_eq!(session.offset_ns(), 1_699_999_998_500_000_000);
    }

    #[test]
    fn log_file_stem_is_timestamped() {
        let session = Session::from_snapshot(ClockSnapshot {
            wall_clock_ns: 1_700_000_000_000_000_000,
            monotonic_ns: 0,
        });

        let stem = session.log_file_stem();
        assert!(stem.starts_with("gps_"));
        assert_eq!(stem.len(), "gps_20231114_221320".len());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let snapshot = ClockSnapshot {
            wall_clock_ns: 0,
            monotonic_ns: 0,
        };
        assert_ne!(
            Session::from_snapshot(snapshot).id,
            Session::from_snapshot(snapshot).id
        );
    }
}
