use std::fmt;
use std::num::NonZero;
use std::time::Duration;

use crate::BatchError;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// The aggregate outcome of dispatching a set of batches.
///
/// A run either succeeded as a whole, in which case the elapsed time of every batch is
/// available in batch id order, or it failed, in which case only the error of the lowest
/// failing batch id is kept. Partial timing data is never exposed alongside an error.
///
/// The summary renders as a human-readable throughput report via [`Display`][fmt::Display]
/// or [`format_report()`].
///
/// # Examples
///
/// ```
/// let batches = bulk_bench::partition(100, 32).unwrap();
/// let summary = batches
///     .dispatch(2, |_worker, _batch| Ok::<(), std::io::Error>(()))
///     .unwrap();
///
/// assert_eq!(summary.durations().unwrap().len(), 4);
/// assert_eq!(summary.items(), 100);
/// println!("{summary}");
/// ```
#[derive(Debug)]
#[must_use = "the summary carries the error of any failed batch"]
pub struct RunSummary<E>
where
    E: std::error::Error + 'static,
{
    outcome: Result<Box<[Duration]>, BatchError<E>>,

    total_duration: Duration,
    items: usize,
    batch_size: NonZero<usize>,
    workers: NonZero<usize>,
}

impl<E> RunSummary<E>
where
    E: std::error::Error + 'static,
{
    pub(crate) fn new(
        outcome: Result<Box<[Duration]>, BatchError<E>>,
        total_duration: Duration,
        items: usize,
        batch_size: NonZero<usize>,
        workers: NonZero<usize>,
    ) -> Self {
        Self {
            outcome,
            total_duration,
            items,
            batch_size,
            workers,
        }
    }

    /// The elapsed time of every batch, indexed by batch id, if no batch failed.
    #[must_use]
    pub fn durations(&self) -> Option<&[Duration]> {
        self.outcome.as_deref().ok()
    }

    /// The error of the lowest failing batch id, if any batch failed.
    #[must_use]
    pub fn error(&self) -> Option<&BatchError<E>> {
        self.outcome.as_ref().err()
    }

    /// Whether every batch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Consumes the summary, returning the per-batch durations or the selected batch error.
    ///
    /// # Errors
    ///
    /// Returns the error of the lowest failing batch id if any batch failed.
    pub fn into_result(self) -> Result<Box<[Duration]>, BatchError<E>> {
        self.outcome
    }

    /// Wall-clock time from the start of the first worker until all results were aggregated.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// The number of items that were partitioned into batches.
    #[must_use]
    pub fn items(&self) -> usize {
        self.items
    }

    /// The configured maximum number of items per batch.
    #[must_use]
    pub fn batch_size(&self) -> NonZero<usize> {
        self.batch_size
    }

    /// The number of workers that were started.
    #[must_use]
    pub fn workers(&self) -> NonZero<usize> {
        self.workers
    }

    /// The total duration divided evenly across all items.
    ///
    /// Returns `None` if there were no items.
    #[must_use]
    pub fn mean_item_duration(&self) -> Option<Duration> {
        let items = u128::try_from(self.items).ok()?;

        let nanos = self.total_duration.as_nanos().checked_div(items)?;

        Some(Duration::from_nanos(
            u64::try_from(nanos).unwrap_or(u64::MAX),
        ))
    }

    /// The number of items processed per second of total duration, rounded down.
    ///
    /// Returns `None` if the total duration is zero.
    #[must_use]
    pub fn items_per_second(&self) -> Option<u64> {
        let items = u128::try_from(self.items).ok()?;

        let per_second = items
            .checked_mul(NANOS_PER_SECOND)?
            .checked_div(self.total_duration.as_nanos())?;

        Some(u64::try_from(per_second).unwrap_or(u64::MAX))
    }
}

impl<E> fmt::Display for RunSummary<E>
where
    E: std::error::Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Operation of {} documents on {} threads with bulk size {}:",
            self.items, self.workers, self.batch_size
        )?;
        writeln!(f, "\tOperation Took: {:?}", self.total_duration)?;

        match self.mean_item_duration() {
            Some(mean) => writeln!(f, "\tOperation Per Document Took: {mean:?}")?,
            None => writeln!(f, "\tOperation Per Document Took: n/a")?,
        }

        match self.items_per_second() {
            Some(throughput) => write!(f, "\tDocuments per Second: {throughput}/s"),
            None => write!(f, "\tDocuments per Second: n/a"),
        }
    }
}

/// Renders the four-line throughput report of a run.
///
/// This is the same text as the [`Display`][fmt::Display] output of [`RunSummary`]. The report
/// is rendered from the summary alone, so rendering the same summary again yields the same text.
#[must_use]
pub fn format_report<E>(summary: &RunSummary<E>) -> String
where
    E: std::error::Error + 'static,
{
    summary.to_string()
}
