use anyhow::Result;
use tracing::info;

use super::event::Event;

/// Fire-and-forget delivery of named events
///
/// Callers log failures and move on; nothing here feeds back into recording.
#[async_trait::async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<()>;
}

/// Writes each event's JSON payload to the log
pub struct TracingNotifier;

#[async_trait::async_trait]
impl EventNotifier for TracingNotifier {
    async fn notify(&self, event: &Event) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        info!("Event: {}", payload);
        Ok(())
    }
}

/// Drops every event (events disabled)
pub struct NoopNotifier;

#[async_trait::async_trait]
impl EventNotifier for NoopNotifier {
    async fn notify(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}
