//! Bounded worker pool
//!
//! Work items are pulled from a source channel and each runs as its own
//! tokio task once a semaphore permit is free, so at most `width` items are
//! in flight. Completions are delivered on a results channel in completion
//! order, tagged with the item and its arrival index. The single receiver of
//! that channel is the stage's aggregator.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// One finished work item
#[derive(Debug)]
pub struct Completed<I, T> {
    /// Arrival order of the item, starting at 0
    pub index: usize,
    pub item: I,
    /// `Err` carries the panic or cancellation message of a failed task
    pub outcome: Result<T, String>,
}

/// Fans work out to at most `width` concurrent tasks
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    width: usize,
}

impl WorkerPool {
    /// Creates a pool; a width of 0 is treated as 1
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs `task` over a fixed list of items
    ///
    /// The returned channel closes after the last completion.
    pub fn run<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> mpsc::Receiver<Completed<I, T>>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (item_tx, item_rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity matches the item count
            let _ = item_tx.try_send(item);
        }
        drop(item_tx);

        self.run_stream(item_rx, task)
    }

    /// Runs `task` over items as they arrive on `source`
    ///
    /// Items are admitted only while a permit is free, so a slow pool applies
    /// back-pressure to the producer. The returned channel closes once
    /// `source` is closed and every admitted item has completed.
    pub fn run_stream<I, T, F, Fut>(
        &self,
        mut source: mpsc::Receiver<I>,
        task: F,
    ) -> mpsc::Receiver<Completed<I, T>>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::channel(self.width * 2);
        let permits = Arc::clone(&self.permits);
        let task = Arc::new(task);

        tokio::spawn(async move {
            let mut index = 0;
            while let Some(item) = source.recv().await {
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };

                let result_tx = result_tx.clone();
                let task = Arc::clone(&task);
                let this_index = index;
                index += 1;

                tokio::spawn(async move {
                    let work = (*task)(item.clone());
                    let outcome = tokio::spawn(work).await.map_err(|e| e.to_string());
                    drop(permit);

                    let _ = result_tx
                        .send(Completed {
                            index: this_index,
                            item,
                            outcome,
                        })
                        .await;
                });
            }
        });

        result_rx
    }
}
