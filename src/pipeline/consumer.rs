use futures::stream::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::chunk::chunked;
use super::sink::SessionLogWriter;
use super::store::SessionStore;
use crate::error::{RecorderError, Result};
use crate::location::SampleSubscription;

/// What the batch consumer did during one session
#[derive(Debug)]
pub struct ConsumerReport {
    /// The session log, still open; the caller closes it
    pub writer: SessionLogWriter,
    pub batches_written: usize,
    /// True if any append failed
    pub write_failed: bool,
}

/// Spawn the task that feeds `store` and appends batches to `writer`
///
/// Every sample is recorded in the store as it arrives; batches of
/// `chunk_size` go to the log. The task finishes when the subscription ends,
/// after flushing the trailing partial batch.
pub fn spawn_consumer(
    subscription: SampleSubscription,
    chunk_size: usize,
    store: SessionStore,
    mut writer: SessionLogWriter,
) -> Result<JoinHandle<ConsumerReport>> {
    let samples = subscription
        .into_stream()
        .inspect(move |sample| store.record(*sample));
    let batches = chunked(samples, chunk_size)?;

    Ok(tokio::spawn(async move {
        info!("Batch consumer started (chunk size {})", chunk_size);
        futures::pin_mut!(batches);

        let mut batches_written = 0;
        let mut write_failed = false;

        while let Some(batch) = batches.next().await {
            debug!("Got a batch of {} samples", batch.len());
            match writer.append(&batch) {
                Ok(()) => batches_written += 1,
                Err(e) => {
                    debug_assert!(
                        !matches!(e, RecorderError::SinkClosed),
                        "batch appended after the session log was closed"
                    );
                    error!("Failed to append batch to {:?}: {}", writer.path(), e);
                    write_failed = true;
                }
            }
        }

        info!(
            "Batch consumer finished: {} batches, {} samples written",
            batches_written,
            writer.samples_written()
        );

        ConsumerReport {
            writer,
            batches_written,
            write_failed,
        }
    }))
}
