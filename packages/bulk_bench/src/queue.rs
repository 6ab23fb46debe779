use std::sync::atomic::{self, AtomicUsize};

use crate::Batch;

/// A pre-populated, single-pass queue of batches shared by the workers of one run.
///
/// The full set of batches is known up front, so claiming the next batch is a single atomic
/// increment of a cursor. Each batch is handed out to exactly one claimant, in id order.
#[derive(Debug)]
pub(crate) struct WorkQueue<'a> {
    batches: &'a [Batch],
    next: AtomicUsize,
}

impl<'a> WorkQueue<'a> {
    pub(crate) fn new(batches: &'a [Batch]) -> Self {
        Self {
            batches,
            next: AtomicUsize::new(0),
        }
    }

    /// Claims the next unclaimed batch, or returns `None` once the queue is exhausted.
    pub(crate) fn claim(&self) -> Option<&'a Batch> {
        // The batches themselves are immutable and the results are only read after all workers
        // have been joined, so the cursor does not need to order any other memory.
        let index = self.next.fetch_add(1, atomic::Ordering::Relaxed);

        self.batches.get(index)
    }
}
