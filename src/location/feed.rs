// Broadcast feed of reconciled samples
//
// A tokio broadcast channel plus a single "latest" slot. New subscribers get
// the most recent sample replayed first, then live samples. Publishing and
// subscribing take the same lock, so a replayed sample never shows up twice.

use futures::stream::{self, Stream};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::warn;

use super::sample::ReconciledSample;

#[derive(Debug, Clone)]
enum FeedMessage {
    Sample(ReconciledSample),
    EndOfSession,
}

struct FeedInner {
    tx: broadcast::Sender<FeedMessage>,
    latest: Mutex<Option<ReconciledSample>>,
}

/// Cloneable handle to the sample broadcast
#[derive(Clone)]
pub struct SampleFeed {
    inner: Arc<FeedInner>,
}

impl SampleFeed {
    /// `capacity` bounds how far a slow subscriber may lag before losing samples
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(FeedInner {
                tx,
                latest: Mutex::new(None),
            }),
        }
    }

    fn lock_latest(&self) -> MutexGuard<'_, Option<ReconciledSample>> {
        self.inner
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn publish(&self, sample: ReconciledSample) {
        let mut latest = self.lock_latest();
        *latest = Some(sample);
        // No subscribers is fine: the latest slot still holds the sample.
        let _ = self.inner.tx.send(FeedMessage::Sample(sample));
    }

    /// Tell current subscribers the session is over and forget the replay slot
    pub(crate) fn end_session(&self) {
        let mut latest = self.lock_latest();
        *latest = None;
        let _ = self.inner.tx.send(FeedMessage::EndOfSession);
    }

    pub(crate) fn reset(&self) {
        *self.lock_latest() = None;
    }

    /// Most recently published sample of the running session
    pub fn latest(&self) -> Option<ReconciledSample> {
        *self.lock_latest()
    }

    pub fn subscribe(&self) -> SampleSubscription {
        let latest = self.lock_latest();
        SampleSubscription {
            replay: *latest,
            rx: self.inner.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

/// One consumer's view of the feed
pub struct SampleSubscription {
    replay: Option<ReconciledSample>,
    rx: broadcast::Receiver<FeedMessage>,
}

impl SampleSubscription {
    /// Next sample, or `None` once the session has ended
    pub async fn recv(&mut self) -> Option<ReconciledSample> {
        if let Some(sample) = self.replay.take() {
            return Some(sample);
        }

        loop {
            match self.rx.recv().await {
                Ok(FeedMessage::Sample(sample)) => return Some(sample),
                Ok(FeedMessage::EndOfSession) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Sample subscriber lagged, {} samples dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Turn the subscription into a stream that ends with the session
    pub fn into_stream(self) -> impl Stream<Item = ReconciledSample> + Send {
        stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|sample| (sample, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> ReconciledSample {
        ReconciledSample {
            utc_timestamp_ns: ts,
            latitude: 1.0,
            longitude: 2.0,
            altitude: 0.0,
            accuracy: 1.0,
            speed: 0.0,
            bearing: 0.0,
        }
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_latest() {
        let feed = SampleFeed::new(16);
        feed.publish(sample(1));
        feed.publish(sample(2));
        feed.publish(sample(3));

        let mut sub = feed.subscribe();
        feed.publish(sample(4));
        feed.end_session();

        assert_eq!(sub.recv().await.map(|s| s.utc_timestamp_ns), Some(3));
        assert_eq!(sub.recv().await.map(|s| s.utc_timestamp_ns), Some(4));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn end_of_session_clears_replay_slot() {
        let feed = SampleFeed::new(16);
        feed.publish(sample(1));
        feed.end_session();

        assert_eq!(feed.latest(), None);

        let mut sub = feed.subscribe();
        feed.publish(sample(2));
        assert_eq!(sub.recv().await.map(|s| s.utc_timestamp_ns), Some(2));
    }
}
