// Integration tests for the batching stage
//
// These tests verify that any stream is split into ordered, non-empty
// batches of at most `chunk_size` items, independent of location semantics.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use gps_recorder::{chunked, RecorderError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

async fn batches_of(input: Vec<u32>, size: usize) -> Result<Vec<Vec<u32>>> {
    Ok(chunked(stream::iter(input), size)?.collect().await)
}

#[tokio::test]
async fn test_batches_concatenate_to_input_for_all_sizes() -> Result<()> {
    for size in 1..=7 {
        for len in 0..=30u32 {
            let input: Vec<u32> = (0..len).collect();
            let batches = batches_of(input.clone(), size).await?;

            let flattened: Vec<u32> = batches.iter().flatten().copied().collect();
            assert_eq!(flattened, input, "size {} len {}: order must be kept", size, len);

            for (i, batch) in batches.iter().enumerate() {
                assert!(!batch.is_empty(), "size {} len {}: empty batch", size, len);
                assert!(batch.len() <= size, "size {} len {}: oversized batch", size, len);
                if i + 1 < batches.len() {
                    assert_eq!(batch.len(), size, "only the last batch may be short");
                }
            }

            let expected_batches = (len as usize).div_ceil(size);
            assert_eq!(batches.len(), expected_batches);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_twenty_five_items_in_tens() -> Result<()> {
    let batches = batches_of((0..25).collect(), 10).await?;

    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(batches[2], vec![20, 21, 22, 23, 24]);

    Ok(())
}

#[test]
fn test_zero_chunk_size_fails_before_consuming_input() {
    let polled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polled);
    let source = stream::iter(0..10).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let result = chunked(source, 0);

    assert!(matches!(result, Err(RecorderError::InvalidArgument(_))));
    assert_eq!(polled.load(Ordering::SeqCst), 0, "source must not be polled");
}

#[tokio::test]
async fn test_chunking_is_lazy() -> Result<()> {
    let polled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polled);
    let source = stream::iter(0..10).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let batches = chunked(source, 4)?;
    assert_eq!(polled.load(Ordering::SeqCst), 0, "nothing consumed before polling");

    futures::pin_mut!(batches);
    let first = batches.next().await;
    assert_eq!(first, Some(vec![0, 1, 2, 3]));
    assert_eq!(polled.load(Ordering::SeqCst), 4, "only one batch worth consumed");

    Ok(())
}

#[tokio::test]
async fn test_partial_batch_flushed_when_live_source_closes() -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<u32>(16);
    let source = stream::poll_fn(move |cx| rx.poll_recv(cx));

    let handle = tokio::spawn(async move {
        let batches = chunked(source, 3).expect("positive chunk size");
        batches.collect::<Vec<_>>().await
    });

    for i in 0..7 {
        tx.send(i).await?;
    }
    drop(tx);

    let batches = handle.await?;
    assert_eq!(batches, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);

    Ok(())
}

#[tokio::test]
async fn test_empty_source_produces_no_batches() -> Result<()> {
    let batches = batches_of(Vec::new(), 10).await?;
    assert!(batches.is_empty(), "no batch may be empty");
    Ok(())
}
