// Fixed-size batching of a stream
//
// Items accumulate until `size` are buffered, then go out as one batch. When
// the source ends, whatever is left goes out as a final short batch. Batches
// are never empty and never reordered.

use futures::stream::{self, Stream, StreamExt};

use crate::error::{RecorderError, Result};

/// Group `source` into batches of `size` items
///
/// Fails with `InvalidArgument` when `size` is zero, before `source` is polled.
pub fn chunked<S>(source: S, size: usize) -> Result<impl Stream<Item = Vec<S::Item>>>
where
    S: Stream,
{
    if size == 0 {
        return Err(RecorderError::InvalidArgument(
            "chunk size must be greater than 0".to_string(),
        ));
    }

    let state = ChunkState {
        source: Box::pin(source),
        buffer: Vec::with_capacity(size),
        finished: false,
    };

    Ok(stream::unfold(state, move |mut state| async move {
        if state.finished {
            return None;
        }

        while let Some(item) = state.source.next().await {
            state.buffer.push(item);
            if state.buffer.len() >= size {
                let batch = std::mem::replace(&mut state.buffer, Vec::with_capacity(size));
                return Some((batch, state));
            }
        }

        state.finished = true;
        if state.buffer.is_empty() {
            None
        } else {
            let batch = std::mem::take(&mut state.buffer);
            Some((batch, state))
        }
    }))
}

struct ChunkState<S: Stream> {
    source: std::pin::Pin<Box<S>>,
    buffer: Vec<S::Item>,
    finished: bool,
}
