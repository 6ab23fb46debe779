use std::sync::OnceLock;
use std::time::Duration;

use crate::{Batch, BatchError};

/// The recorded outcome of one batch.
#[derive(Debug)]
pub(crate) struct Slot<E> {
    pub(crate) elapsed: Duration,
    pub(crate) outcome: Result<(), E>,
}

/// One write-once result cell per batch id.
///
/// Every batch id is claimed by exactly one worker, so every cell is written by exactly one
/// thread and the cells never contend. They are only read back after all workers are joined.
#[derive(Debug)]
pub(crate) struct ResultSlots<E> {
    slots: Box<[OnceLock<Slot<E>>]>,
}

impl<E> ResultSlots<E>
where
    E: std::error::Error + 'static,
{
    pub(crate) fn new(batch_count: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(OnceLock::new)
                .take(batch_count)
                .collect(),
        }
    }

    /// Stores the outcome of the batch.
    ///
    /// # Panics
    ///
    /// Panics if the batch does not belong to the run the slots were created for, or if the
    /// batch has already been recorded. Both mean the work queue handed out a batch twice.
    pub(crate) fn record(&self, batch: &Batch, slot: Slot<E>) {
        let cell = self
            .slots
            .get(batch.id())
            .expect("batch id must be within the partitioned sequence of this run");

        assert!(
            cell.set(slot).is_ok(),
            "{batch} was recorded twice - each batch must be claimed by exactly one worker"
        );
    }

    /// Turns the recorded slots into the ordered elapsed times of all batches, or the error of
    /// the lowest failing batch id.
    ///
    /// Batches are inspected in id order and the first failure wins, independent of the order
    /// in which the batches actually finished. Recorded durations are discarded on failure.
    ///
    /// # Panics
    ///
    /// Panics if any batch was never recorded.
    pub(crate) fn compact(self, batches: &[Batch]) -> Result<Box<[Duration]>, BatchError<E>> {
        assert_eq!(
            batches.len(),
            self.slots.len(),
            "result slots must be created for the batches being compacted"
        );

        let mut durations = Vec::with_capacity(self.slots.len());

        for (batch, cell) in batches.iter().zip(self.slots) {
            let slot = cell
                .into_inner()
                .expect("every batch must be recorded before the results are compacted");

            match slot.outcome {
                Ok(()) => durations.push(slot.elapsed),
                Err(source) => return Err(BatchError::new(*batch, source)),
            }
        }

        Ok(durations.into_boxed_slice())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt;

    use super::*;
    use crate::partition;

    #[derive(Debug, PartialEq)]
    struct TestError(usize);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test error {}", self.0)
        }
    }

    impl std::error::Error for TestError {}

    fn ok(millis: u64) -> Slot<TestError> {
        Slot {
            elapsed: Duration::from_millis(millis),
            outcome: Ok(()),
        }
    }

    fn failed(millis: u64, code: usize) -> Slot<TestError> {
        Slot {
            elapsed: Duration::from_millis(millis),
            outcome: Err(TestError(code)),
        }
    }

    #[test]
    fn compacts_durations_in_id_order() {
        let batches = partition(4, 1).unwrap();
        let slots = ResultSlots::new(batches.len());

        // Recorded out of order, as concurrent workers would.
        for (id, millis) in [(2, 30), (0, 10), (3, 40), (1, 20)] {
            slots.record(batches.get(id).unwrap(), ok(millis));
        }

        let durations = slots.compact(batches.as_slice()).unwrap();

        assert_eq!(
            &*durations,
            [10, 20, 30, 40].map(Duration::from_millis).as_slice()
        );
    }

    #[test]
    fn lowest_failing_id_wins() {
        let batches = partition(6, 1).unwrap();
        let slots = ResultSlots::new(batches.len());

        // Batch 4 fails "first", batch 1 fails later; batch 1 must still be reported.
        slots.record(batches.get(4).unwrap(), failed(1, 4));
        slots.record(batches.get(0).unwrap(), ok(1));
        slots.record(batches.get(5).unwrap(), ok(1));
        slots.record(batches.get(1).unwrap(), failed(1, 1));
        slots.record(batches.get(3).unwrap(), ok(1));
        slots.record(batches.get(2).unwrap(), failed(1, 2));

        let error = slots.compact(batches.as_slice()).unwrap_err();

        assert_eq!(error.batch().id(), 1);
        assert_eq!(error.into_inner(), TestError(1));
    }

    #[test]
    fn empty_slots_compact_to_empty_durations() {
        let batches = partition(0, 1).unwrap();
        let slots = ResultSlots::<TestError>::new(batches.len());

        let durations = slots.compact(batches.as_slice()).unwrap();

        assert!(durations.is_empty());
    }

    #[test]
    #[should_panic(expected = "recorded twice")]
    fn double_record_panics() {
        let batches = partition(2, 1).unwrap();
        let slots = ResultSlots::new(batches.len());

        slots.record(batches.get(0).unwrap(), ok(1));
        slots.record(batches.get(0).unwrap(), ok(2));
    }

    #[test]
    #[should_panic(expected = "every batch must be recorded")]
    fn unrecorded_slot_panics_on_compact() {
        let batches = partition(2, 1).unwrap();
        let slots = ResultSlots::new(batches.len());

        slots.record(batches.get(1).unwrap(), ok(1));

        _ = slots.compact(batches.as_slice());
    }
}
