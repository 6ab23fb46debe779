use thiserror::Error;

use crate::Batch;

/// Errors raised when a bulk run is configured with values that cannot describe any work.
///
/// These are always detected before any worker starts, so no unit of work has been invoked
/// when one of these is returned.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The batch size was zero, which would never make progress through the item range.
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// The worker count was zero, which would leave the work queue without consumers.
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
}

/// A specialized `Result` type for bulk run configuration, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The failure of a single batch, as selected by aggregation.
///
/// When several batches fail during one run, the one with the lowest batch id is reported,
/// regardless of which failure happened first in real time.
#[derive(Debug, Error)]
#[error("{batch} failed: {source}")]
pub struct BatchError<E>
where
    E: std::error::Error + 'static,
{
    batch: Batch,

    #[source]
    source: E,
}

impl<E> BatchError<E>
where
    E: std::error::Error + 'static,
{
    pub(crate) fn new(batch: Batch, source: E) -> Self {
        Self { batch, source }
    }

    /// The batch whose unit of work failed.
    #[must_use]
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// The error returned by the unit of work for this batch.
    #[must_use]
    pub fn inner(&self) -> &E {
        &self.source
    }

    /// Consumes the error, returning the error returned by the unit of work.
    #[must_use]
    pub fn into_inner(self) -> E {
        self.source
    }
}
