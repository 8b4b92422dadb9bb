use serde::{Deserialize, Serialize};

/// Name used when no custom name and no address is available
pub const DEFAULT_EVENT_NAME: &str = "gps_event";

/// Sent when a recording session starts
pub const BEGIN_EVENT_NAME: &str = "gps.begin";

/// Sent when a recording session stops
pub const END_EVENT_NAME: &str = "gps.end";

/// Named event delivered to the event endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_NAME)
    }
}
