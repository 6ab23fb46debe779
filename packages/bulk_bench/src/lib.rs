#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Parallel batch execution with per-batch timing, for driving bulk workloads such as load
//! generation against a remote store.
//!
//! A workload of `item_count` items is split into contiguous batches of a bounded size. A fixed
//! pool of worker threads drains the batches from a shared queue, calling a unit of work for each
//! batch and timing every call. Once all workers are done, the results are aggregated in batch
//! order into a [`RunSummary`] that renders as a throughput report.
//!
//! The core functionality includes:
//! - [`partition()`] - Splits an item count into an ordered sequence of [`Batch`]
//! - [`dispatch()`] - Executes a unit of work for every batch on a fixed number of workers
//! - [`RunSummary`] - Per-batch durations or the failure of the run, plus throughput figures
//! - [`format_report()`] - Renders a [`RunSummary`] as a human-readable throughput report
//!
//! # Operating Principles
//!
//! ## Batches
//!
//! A [`Batch`] is a half-open range of item indexes. The caller keeps its own items (document
//! keys, payloads, ...) in a slice and uses [`Batch::items()`] to select the items that belong
//! to a batch. Every batch is full except possibly the last one.
//!
//! ## Workers
//!
//! Workers claim batches first-come-first-served, so faster workers absorb more batches. There
//! is no ordering between the execution of different batches. A worker that finds no unclaimed
//! batches exits, and [`dispatch()`] returns once every worker has exited.
//!
//! ## Failures
//!
//! A failing batch does not stop the other workers: every batch is executed and timed. When the
//! run completes, the batches are inspected in id order and the first failure becomes the outcome
//! of the whole run, discarding all timing data. The selected failure is therefore always the
//! one with the lowest batch id, no matter which failure happened first in real time.
//!
//! # Example
//!
//! ```
//! use std::sync::Mutex;
//!
//! let keys = (0..100).map(|i| format!("doc-{i}")).collect::<Vec<_>>();
//! let stored = Mutex::new(Vec::new());
//!
//! let batches = bulk_bench::partition(keys.len(), 32).unwrap();
//!
//! let summary = batches
//!     .dispatch(2, |_worker, batch| {
//!         // This is where a bulk request for the batch would be issued.
//!         stored.lock().unwrap().extend_from_slice(batch.items(&keys));
//!         Ok::<(), std::io::Error>(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(stored.lock().unwrap().len(), 100);
//!
//! match summary.error() {
//!     None => println!("{summary}"),
//!     Some(e) => eprintln!("Error: {e}"),
//! }
//! ```

mod batch;
mod dispatch;
mod error;
mod queue;
mod slots;
mod summary;

pub use batch::*;
pub use dispatch::*;
pub use error::*;
pub use summary::*;
