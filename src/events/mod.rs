pub mod event;
pub mod geocode;
pub mod notifier;

pub use event::{Event, BEGIN_EVENT_NAME, DEFAULT_EVENT_NAME, END_EVENT_NAME};
pub use geocode::ReverseGeocoder;
pub use notifier::{EventNotifier, NoopNotifier, TracingNotifier};
