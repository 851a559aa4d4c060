//! Scheduler for driving the crawl to its fixpoint
//!
//! This module handles:
//! - The FIFO queue of work items waiting for a worker
//! - Deduplication of discovered items against everything ever enqueued
//! - A fixed pool of workers bounding how many items are in flight
//! - Containing per-item failures (errors and panics) to that item
//!
//! The scheduler loop owns the queue and is the only caller of
//! [`CrawlState::mark_visited`]. Work goes out to the workers over a bounded
//! channel and completions come back with the items they discovered. The run
//! ends when the queue is empty and no item is in flight.

use crate::crawler::work::{ItemOutcome, WorkItem};
use crate::state::{CrawlState, ItemState};
use crate::Result;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Work queue and worker pool for one crawl run
pub struct Scheduler {
    state: Arc<CrawlState>,
    concurrency: usize,
    pending: VecDeque<WorkItem>,
}

impl Scheduler {
    /// Creates a scheduler running at most `concurrency` items at once
    pub fn new(state: Arc<CrawlState>, concurrency: usize) -> Self {
        Self {
            state,
            concurrency: concurrency.max(1),
            pending: VecDeque::new(),
        }
    }

    /// Queues an item unless its identity was ever enqueued before
    ///
    /// Returns `true` if the item was queued.
    pub fn enqueue(&mut self, item: WorkItem) -> bool {
        if !self.state.mark_visited(item.key()) {
            tracing::trace!(item = %item, "Already visited");
            return false;
        }
        tracing::debug!(item = %item, "Queued");
        self.pending.push_back(item);
        true
    }

    /// Number of items waiting for a worker
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Runs until every enqueued item, and everything they discover, is done
    ///
    /// `process` handles one item and reports its final state and the items
    /// it discovered. An error or a panic in `process` marks that item
    /// [`ItemState::Failed`] and the crawl carries on.
    ///
    /// # Returns
    ///
    /// The number of items handed to workers
    pub async fn run<F, Fut>(mut self, process: F) -> usize
    where
        F: Fn(WorkItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ItemOutcome>> + Send + 'static,
    {
        let process = Arc::new(process);
        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(self.concurrency);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Vec<WorkItem>>();

        let mut workers = JoinSet::new();
        for worker_id in 0..self.concurrency {
            workers.spawn(worker(
                worker_id,
                Arc::clone(&work_rx),
                done_tx.clone(),
                Arc::clone(&self.state),
                Arc::clone(&process),
            ));
        }
        drop(done_tx);

        let mut in_flight = 0usize;
        let mut dispatched = 0usize;

        loop {
            // Never more than `concurrency` sent-but-unfinished items, so the
            // bounded channel always has room and `send` cannot stall.
            while in_flight < self.concurrency {
                let Some(item) = self.pending.pop_front() else {
                    break;
                };
                if work_tx.send(item).await.is_err() {
                    tracing::error!("All crawl workers exited early");
                    self.pending.clear();
                    break;
                }
                in_flight += 1;
                dispatched += 1;
            }

            if in_flight == 0 {
                break;
            }

            match done_rx.recv().await {
                Some(discovered) => {
                    in_flight -= 1;
                    for item in discovered {
                        self.enqueue(item);
                    }
                }
                None => break,
            }
        }

        drop(work_tx);
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Crawl worker terminated abnormally");
            }
        }

        tracing::debug!(dispatched = dispatched, "Scheduler drained");
        dispatched
    }
}

async fn worker<F, Fut>(
    worker_id: usize,
    work_rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    done_tx: mpsc::UnboundedSender<Vec<WorkItem>>,
    state: Arc<CrawlState>,
    process: Arc<F>,
) where
    F: Fn(WorkItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ItemOutcome>> + Send + 'static,
{
    loop {
        let next = work_rx.lock().await.recv().await;
        let Some(item) = next else {
            break;
        };

        let discovered = process_item(&state, &process, item).await;
        if done_tx.send(discovered).is_err() {
            break;
        }
    }
    tracing::trace!(worker = worker_id, "Worker finished");
}

async fn process_item<F, Fut>(state: &CrawlState, process: &Arc<F>, item: WorkItem) -> Vec<WorkItem>
where
    F: Fn(WorkItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ItemOutcome>> + Send + 'static,
{
    let key = item.key();
    if !state.begin(&key) {
        tracing::debug!(item = %item, "Skipping item already processed");
        return Vec::new();
    }

    let label = item.to_string();
    // Both the call and its future run in a separate task, so a panic in
    // either is caught at this item's boundary
    let process = Arc::clone(process);
    let outcome = match tokio::spawn(async move { process(item).await }).await {
        Ok(Ok(outcome)) if outcome.state.is_terminal() => outcome,
        Ok(Ok(outcome)) => {
            tracing::error!(item = %label, state = %outcome.state, "Item finished in a non-terminal state");
            ItemOutcome::done(ItemState::Failed)
        }
        Ok(Err(e)) => {
            tracing::error!(item = %label, error = %e, "Failed to process item");
            ItemOutcome::done(ItemState::Failed)
        }
        Err(e) => {
            tracing::error!(item = %label, error = %e, "Item processing panicked");
            ItemOutcome::done(ItemState::Failed)
        }
    };

    state.finish(&key, outcome.state);
    outcome.discovered
}
