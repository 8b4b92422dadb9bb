//! Out-of-band control: the toggle coordinator remote triggers go through,
//! and the marker file remote "send event" requests append to.

pub mod coordinator;
pub mod marker;

pub use coordinator::{ToggleCallback, ToggleCoordinator};
pub use marker::{append_marker, MARKER_FILE_NAME};
