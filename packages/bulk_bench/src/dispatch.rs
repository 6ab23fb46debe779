use std::num::NonZero;
use std::time::Instant;
use std::{panic, thread};

use tracing::{debug, trace, warn};

use crate::queue::WorkQueue;
use crate::slots::{ResultSlots, Slot};
use crate::{Batch, Batches, Error, Result, RunSummary};

impl Batches {
    /// Executes a unit of work for every batch on a fixed pool of worker threads.
    ///
    /// This is a convenience method that calls [`dispatch()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWorkerCount`] if `workers` is zero.
    pub fn dispatch<F, E>(&self, workers: usize, unit_of_work: F) -> Result<RunSummary<E>>
    where
        F: Fn(usize, &Batch) -> std::result::Result<(), E> + Sync,
        E: std::error::Error + Send + Sync + 'static,
    {
        dispatch(self, workers, unit_of_work)
    }
}

/// Executes a unit of work for every batch on a fixed pool of worker threads, timing each call.
///
/// Exactly `workers` threads are started. Each thread repeatedly claims the next unclaimed batch
/// and calls `unit_of_work(worker_index, batch)`, measuring the wall-clock time of that one call.
/// A thread exits when no unclaimed batches remain. If there are more workers than batches, the
/// excess workers exit without doing anything.
///
/// A failing batch does not stop the run: every batch is executed and timed regardless of the
/// outcome of other batches. After all workers have exited, the outcomes are aggregated in batch
/// id order and the error of the lowest failing batch id, if any, becomes the outcome of the run.
///
/// The function returns only after every worker has exited.
///
/// # Errors
///
/// Returns [`Error::InvalidWorkerCount`] if `workers` is zero. No work is performed in that case.
/// Failures of individual batches are not errors of this function; they are reported through
/// [`RunSummary::error()`].
///
/// # Panics
///
/// If `unit_of_work` panics, the panic is propagated once all workers have exited.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let written = AtomicUsize::new(0);
/// let batches = bulk_bench::partition(1000, 64).unwrap();
///
/// let summary = bulk_bench::dispatch(&batches, 4, |_worker, batch| {
///     written.fetch_add(batch.len(), Ordering::Relaxed);
///     Ok::<(), std::io::Error>(())
/// })
/// .unwrap();
///
/// assert_eq!(written.load(Ordering::Relaxed), 1000);
/// assert_eq!(summary.durations().unwrap().len(), batches.len());
/// ```
pub fn dispatch<F, E>(batches: &Batches, workers: usize, unit_of_work: F) -> Result<RunSummary<E>>
where
    F: Fn(usize, &Batch) -> std::result::Result<(), E> + Sync,
    E: std::error::Error + Send + Sync + 'static,
{
    let workers = NonZero::new(workers).ok_or(Error::InvalidWorkerCount)?;

    debug!(
        batches = batches.len(),
        items = batches.item_count(),
        batch_size = batches.batch_size().get(),
        workers = workers.get(),
        "dispatching batches"
    );

    let queue = WorkQueue::new(batches.as_slice());
    let slots = ResultSlots::new(batches.len());

    let start = Instant::now();

    let worker_panic = thread::scope(|scope| {
        let handles = (0..workers.get())
            .map(|worker| {
                let queue = &queue;
                let slots = &slots;
                let unit_of_work = &unit_of_work;

                scope.spawn(move || drain(worker, queue, slots, unit_of_work))
            })
            .collect::<Vec<_>>();

        // Joined by hand so the original panic payload reaches the caller instead of the
        // generic one raised by the scope.
        let mut first_panic = None;

        for handle in handles {
            if let Err(payload) = handle.join() {
                first_panic.get_or_insert(payload);
            }
        }

        first_panic
    });

    if let Some(payload) = worker_panic {
        panic::resume_unwind(payload);
    }

    let outcome = slots.compact(batches.as_slice());

    let total_duration = start.elapsed();

    debug!(
        ?total_duration,
        succeeded = outcome.is_ok(),
        "all batches dispatched"
    );

    Ok(RunSummary::new(
        outcome,
        total_duration,
        batches.item_count(),
        batches.batch_size(),
        workers,
    ))
}

/// Worker loop: claims and executes batches until the queue is exhausted.
fn drain<F, E>(worker: usize, queue: &WorkQueue<'_>, slots: &ResultSlots<E>, unit_of_work: &F)
where
    F: Fn(usize, &Batch) -> std::result::Result<(), E>,
    E: std::error::Error + 'static,
{
    let mut executed: usize = 0;

    while let Some(batch) = queue.claim() {
        let started = Instant::now();
        let outcome = unit_of_work(worker, batch);
        let elapsed = started.elapsed();

        if let Err(e) = &outcome {
            warn!(worker, batch = batch.id(), error = %e, "batch failed");
        }

        slots.record(batch, Slot { elapsed, outcome });

        executed = executed.wrapping_add(1);
    }

    trace!(worker, executed, "worker found the queue empty");
}
