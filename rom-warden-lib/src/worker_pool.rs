//! Worker pool for concurrent per-file processing with backpressure.
//!
//! Spawns N persistent tokio tasks that pull work items from a bounded
//! async-channel. Results are sent to an unbounded channel drained by the
//! scan driver, which is the single writer into the catalog store.
//!
//! Uses `async-channel` for work distribution — its `Receiver` is `Clone`,
//! so each worker gets its own handle with no `Mutex` needed. This avoids
//! the `Arc<Mutex<mpsc::Receiver>>` anti-pattern where one worker holds the
//! lock while blocked on `recv()`, starving all others.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::cancel::CancelToken;

/// Hard safety-net timeout per work item. Hashing a multi-gigabyte disc
/// image on slow storage is the worst expected case; anything past this is
/// treated as hung and dropped so the pool never deadlocks.
const SAFETY_TIMEOUT: Duration = Duration::from_secs(600);

/// A pool of worker tasks that process items concurrently.
///
/// Workers pull from a bounded work channel (capacity N) giving natural
/// backpressure, and stop early when the cancel token fires: queued items
/// are drained without being processed, so cancellation takes effect at
/// the next item boundary.
pub struct WorkerPool<R: Send + 'static> {
    result_rx: mpsc::UnboundedReceiver<R>,
    _handles: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Spawn `n` workers over `items`, processing each with `process_fn`.
    ///
    /// Submission happens in a background task so the caller can start
    /// receiving results immediately. Dropping the pool (receiver) stops
    /// the workers at their next item.
    pub fn start<W, F, Fut>(n: usize, items: Vec<W>, cancel: CancelToken, process_fn: F) -> Self
    where
        W: Send + 'static,
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let n = n.max(1);
        let (work_tx, work_rx) = async_channel::bounded::<W>(n);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<R>();
        let process_fn = Arc::new(process_fn);

        let handles: Vec<JoinHandle<()>> = (0..n)
            .map(|_| {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let process_fn = process_fn.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    while let Ok(item) = work_rx.recv().await {
                        if cancel.is_cancelled() {
                            // Drain without processing so submission ends
                            continue;
                        }
                        match tokio::time::timeout(SAFETY_TIMEOUT, process_fn(item)).await {
                            Ok(result) => {
                                if result_tx.send(result).is_err() {
                                    break; // receiver dropped
                                }
                            }
                            Err(_) => {
                                log::warn!(
                                    "worker pool: item exceeded {}s safety timeout, skipped",
                                    SAFETY_TIMEOUT.as_secs()
                                );
                            }
                        }
                    }
                })
            })
            .collect();

        // Drop our copy so the result channel closes when workers finish
        drop(result_tx);

        tokio::spawn(async move {
            for item in items {
                if work_tx.send(item).await.is_err() {
                    break;
                }
            }
            // work_tx dropped -> channel closes -> workers drain and stop
        });

        Self {
            result_rx,
            _handles: handles,
        }
    }

    /// Receive the next result. `None` once every item is processed and
    /// all workers have shut down.
    pub async fn recv(&mut self) -> Option<R> {
        self.result_rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn processes_all_items() {
        let items: Vec<u32> = (0..100).collect();
        let mut pool = WorkerPool::start(4, items, CancelToken::new(), |n| async move { n * 2 });

        let mut results = Vec::new();
        while let Some(r) = pool.recv().await {
            results.push(r);
        }
        results.sort_unstable();
        assert_eq!(results.len(), 100);
        assert_eq!(results[0], 0);
        assert_eq!(results[99], 198);
    }

    #[tokio::test]
    async fn cancellation_stops_scheduling() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let items: Vec<u32> = (0..50).collect();
        let mut pool = WorkerPool::start(2, items, cancel, |n| async move { n });

        let mut count = 0;
        while pool.recv().await.is_some() {
            count += 1;
        }
        // Pre-cancelled: workers drain everything without processing
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn zero_workers_clamps_to_one() {
        let mut pool =
            WorkerPool::start(0, vec![1u32, 2, 3], CancelToken::new(), |n| async move { n });
        let mut seen = 0;
        while pool.recv().await.is_some() {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}
