pub mod backend;
pub mod clock;
pub mod feed;
pub mod replay;
pub mod sample;
pub mod simulated;
pub mod source;

pub use backend::{
    LocationBackend, LocationBackendFactory, ReplayConfig, SimulatedConfig, SourceKind,
};
pub use clock::{compute_offset, reconcile, Clock, ClockSnapshot, SystemClock};
pub use feed::{SampleFeed, SampleSubscription};
pub use replay::{parse_replay, ReplayBackend, ReplayRecord};
pub use sample::{RawSample, ReconciledSample};
pub use simulated::SimulatedBackend;
pub use source::{LocationSource, SourcePhase};
