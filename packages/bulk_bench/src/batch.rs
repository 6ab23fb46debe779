use std::num::NonZero;
use std::ops::Range;
use std::slice;

use crate::{Error, Result};

/// A contiguous half-open range `[start, end)` of item indexes that is processed as one unit
/// of work by one worker.
///
/// Batches are produced by [`partition()`] and are never empty. The batch id is the position of
/// the batch in the partitioned sequence and is used to order results after a run.
///
/// # Examples
///
/// ```
/// let batches = bulk_bench::partition(10, 3).unwrap();
/// let last = batches.iter().last().unwrap();
///
/// assert_eq!(last.id(), 3);
/// assert_eq!(last.range(), 9..10);
/// assert_eq!(last.to_string(), "batch 3 [9, 10)");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, derive_more::Display)]
#[display("batch {id} [{start}, {end})")]
pub struct Batch {
    id: usize,
    start: usize,
    end: usize,
}

impl Batch {
    /// The position of this batch in its partitioned sequence, starting from 0.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The first item index in the batch (inclusive).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// The end of the batch (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The item indexes covered by the batch.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The number of items in the batch. Always at least 1.
    #[must_use]
    #[expect(clippy::len_without_is_empty, reason = "batches are never empty")]
    pub fn len(&self) -> usize {
        self.range().len()
    }

    /// Selects the items of this batch out of a slice that holds all partitioned items.
    ///
    /// The item type is up to the caller: document keys, payloads or anything else that is
    /// indexed the same way as the partitioned range.
    ///
    /// # Panics
    ///
    /// Panics if `all` is shorter than the end of this batch, which means it is not the
    /// sequence the batch was partitioned from.
    ///
    /// # Examples
    ///
    /// ```
    /// let keys = ["a", "b", "c", "d", "e"];
    /// let batches = bulk_bench::partition(keys.len(), 2).unwrap();
    ///
    /// let second = batches.get(1).unwrap();
    /// assert_eq!(second.items(&keys), ["c", "d"]);
    /// ```
    #[must_use]
    pub fn items<'a, T>(&self, all: &'a [T]) -> &'a [T] {
        all.get(self.range())
            .expect("batch must be applied to the item sequence it was partitioned from")
    }
}

/// An ordered sequence of [`Batch`] that exactly covers the item range `[0, item_count)`.
///
/// Created by [`partition()`] and consumed by [`dispatch()`][crate::dispatch].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Batches {
    batches: Box<[Batch]>,
    item_count: usize,
    batch_size: NonZero<usize>,
}

impl Batches {
    /// The number of batches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether there are no batches, which is the case when the item count is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The total number of items covered by all batches.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// The maximum number of items in each batch.
    #[must_use]
    pub fn batch_size(&self) -> NonZero<usize> {
        self.batch_size
    }

    /// Returns the batch with the given id, if it exists.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Batch> {
        self.batches.get(id)
    }

    /// Iterates over the batches in ascending id order.
    pub fn iter(&self) -> slice::Iter<'_, Batch> {
        self.batches.iter()
    }

    pub(crate) fn as_slice(&self) -> &[Batch] {
        &self.batches
    }
}

impl<'a> IntoIterator for &'a Batches {
    type Item = &'a Batch;
    type IntoIter = slice::Iter<'a, Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Splits `item_count` items into contiguous batches of at most `batch_size` items each.
///
/// Every batch holds exactly `batch_size` items except possibly the last one, which holds the
/// remainder. Batch ids ascend from 0 in item order. Zero items yield zero batches.
///
/// # Errors
///
/// Returns [`Error::InvalidBatchSize`] if `batch_size` is zero.
///
/// # Examples
///
/// ```
/// let batches = bulk_bench::partition(100, 32).unwrap();
///
/// let ranges = batches.iter().map(|b| b.range()).collect::<Vec<_>>();
/// assert_eq!(ranges, [0..32, 32..64, 64..96, 96..100]);
/// ```
pub fn partition(item_count: usize, batch_size: usize) -> Result<Batches> {
    let batch_size = NonZero::new(batch_size).ok_or(Error::InvalidBatchSize)?;

    let batches = (0..item_count)
        .step_by(batch_size.get())
        .enumerate()
        .map(|(id, start)| Batch {
            id,
            start,
            end: start.saturating_add(batch_size.get()).min(item_count),
        })
        .collect();

    Ok(Batches {
        batches,
        item_count,
        batch_size,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::indexing_slicing, reason = "test code with known array bounds")]

    use super::*;

    fn ranges(batches: &Batches) -> Vec<Range<usize>> {
        batches.iter().map(Batch::range).collect()
    }

    /// Asserts the partitioning invariants: exact coverage, ascending ids from 0, and full
    /// batches everywhere except possibly at the end.
    fn assert_partitions(item_count: usize, batch_size: usize) {
        let batches = partition(item_count, batch_size).unwrap();

        assert_eq!(batches.item_count(), item_count);
        assert_eq!(batches.batch_size().get(), batch_size);
        assert_eq!(batches.len(), item_count.div_ceil(batch_size));

        let mut expected_start = 0;

        for (index, batch) in batches.iter().enumerate() {
            assert_eq!(batch.id(), index);
            assert_eq!(batch.start(), expected_start);
            assert!(batch.len() > 0);
            assert!(batch.len() <= batch_size);

            if index + 1 < batches.len() {
                assert_eq!(batch.len(), batch_size);
            }

            expected_start = batch.end();
        }

        assert_eq!(expected_start, item_count);
    }

    #[test]
    fn partition_invariants_hold() {
        for item_count in 0..=70 {
            for batch_size in 1..=12 {
                assert_partitions(item_count, batch_size);
            }
        }

        assert_partitions(10_000, 32);
        assert_partitions(10_001, 1000);
    }

    #[test]
    fn hundred_items_in_batches_of_32() {
        let batches = partition(100, 32).unwrap();

        assert_eq!(ranges(&batches), [0..32, 32..64, 64..96, 96..100]);

        let sizes = batches.iter().map(Batch::len).collect::<Vec<_>>();
        assert_eq!(sizes, [32, 32, 32, 4]);
    }

    #[test]
    fn ten_items_in_batches_of_3() {
        let batches = partition(10, 3).unwrap();

        assert_eq!(ranges(&batches), [0..3, 3..6, 6..9, 9..10]);

        let sizes = batches.iter().map(Batch::len).collect::<Vec<_>>();
        assert_eq!(sizes, [3, 3, 3, 1]);
    }

    #[test]
    fn exact_multiple_has_no_short_batch() {
        let batches = partition(96, 32).unwrap();

        assert_eq!(ranges(&batches), [0..32, 32..64, 64..96]);
    }

    #[test]
    fn batch_larger_than_item_count_yields_single_batch() {
        let batches = partition(5, 1000).unwrap();

        assert_eq!(ranges(&batches), [0..5]);
    }

    #[test]
    fn zero_items_yields_no_batches() {
        for batch_size in [1, 2, 32, usize::MAX] {
            let batches = partition(0, batch_size).unwrap();

            assert!(batches.is_empty());
            assert_eq!(batches.len(), 0);
            assert_eq!(batches.item_count(), 0);
        }
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert_eq!(partition(100, 0).unwrap_err(), Error::InvalidBatchSize);
        assert_eq!(partition(0, 0).unwrap_err(), Error::InvalidBatchSize);
    }

    #[test]
    fn huge_batch_size_does_not_overflow() {
        let batches = partition(usize::MAX, usize::MAX).unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches.get(0).unwrap().range(), 0..usize::MAX);
    }

    #[test]
    fn items_selects_batch_slice() {
        let keys = (0..10).map(|i| format!("doc-{i}")).collect::<Vec<_>>();
        let batches = partition(keys.len(), 4).unwrap();

        let selected = batches
            .iter()
            .map(|batch| batch.items(&keys).to_vec())
            .collect::<Vec<_>>();

        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0], ["doc-0", "doc-1", "doc-2", "doc-3"]);
        assert_eq!(selected[2], ["doc-8", "doc-9"]);
        assert_eq!(selected.concat(), keys);
    }

    #[test]
    #[should_panic(expected = "item sequence it was partitioned from")]
    fn items_from_shorter_sequence_panics() {
        let batches = partition(10, 4).unwrap();
        let too_short = [0_u8; 5];

        _ = batches.get(2).unwrap().items(&too_short);
    }

    #[test]
    fn into_iterator_matches_iter() {
        let batches = partition(7, 2).unwrap();

        let mut ids = Vec::new();
        for batch in &batches {
            ids.push(batch.id());
        }

        assert_eq!(ids, [0, 1, 2, 3]);
    }
}
