#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Load-generation harness for document stores, driving bulk create, read and update requests
//! at a fixed concurrency and reporting the throughput of every step.
//!
//! Every operation is a sequence of bulk steps. Each step splits its documents into batches of
//! the configured bulk size and executes them on the configured number of worker threads via
//! [`bulk_bench`]. A step either succeeds as a whole and produces a throughput report, or fails
//! with the error of its lowest failing batch, in which case no report is produced.
//!
//! # Usage
//!
//! ```text
//! doc_bench [--config <FILE>] [--endpoint <URL>]... [--database <NAME>] [--collection <NAME>]
//!           [--threads <N>] [--bulk <N>] [--latency-ms <MS>] <SUBCOMMAND>
//! ```
//!
//! ## Subcommands
//!
//! - `generate [--count <N>] [--output <FILE>]`: creates `N` new documents with keys of the form
//!   `doc-<run id>-<index>` and writes the keys to `FILE`, one per line.
//! - `perf --file <FILE> [--modification <JSON>]`: reads the documents listed in `FILE`, merges
//!   the JSON object into each of them and writes them back, first with PATCH and then with PUT
//!   semantics.
//! - `roundtrip [--count <N>] [--output <FILE>] [--modification <JSON>]`: `generate` followed by
//!   `perf` over the generated keys, against the same store.
//!
//! ## Configuration
//!
//! Options can also be given in a TOML file passed via `--config`. Options given on the command
//! line take precedence over the file, which takes precedence over the built-in defaults.
//!
//! ```toml
//! endpoints = ["tcp://db-1:8529", "tcp://db-2:8529"]
//! database = "benchmark"
//! collection = "benchmark"
//! threads = 8
//! bulk = 64
//! latency_ms = 2
//! ```
//!
//! # Store
//!
//! Documents are kept by an in-process store that optionally adds a fixed latency to every
//! request. The store lives as long as the process, so `perf` only finds documents created by
//! the same invocation; `roundtrip` is the way to run both halves against one store.
//!
//! # Logging
//!
//! Diagnostics are written to stderr via `tracing`, filtered by the `RUST_LOG` environment
//! variable. Reports are written to stdout.

mod config;
mod endpoints;
mod store;
mod types;
mod workflow;

pub use config::*;
pub use endpoints::*;
pub use store::StoreError;
pub use types::*;

use store::StoreFacade;
use workflow::Harness;

/// Core logic of the tool.
///
/// Executes the requested operation against a fresh in-memory store, passing the report of every
/// completed step to `on_report` as soon as the step ends.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, if the keys file cannot be read or written,
/// if the modification is not a JSON object or if any bulk request of a step fails. Steps after
/// the failing one are not executed.
#[doc(hidden)]
pub fn run<O>(input: &RunInput, mut on_report: O) -> Result<(), RunError>
where
    O: FnMut(StepReport),
{
    input.config.validate()?;

    let store = StoreFacade::memory(&input.config);

    run_with_store(input, &store, &mut on_report)
}

fn run_with_store<O>(
    input: &RunInput,
    store: &StoreFacade,
    on_report: &mut O,
) -> Result<(), RunError>
where
    O: FnMut(StepReport),
{
    let mut rng = rand::rng();

    let harness = Harness::new(&input.config, store, &mut rng);

    match &input.operation {
        Operation::Generate { count, output } => {
            harness.generate(*count, output, &mut rng, on_report)
        }
        Operation::Perf {
            keys_file,
            modification,
        } => harness.perf(keys_file, modification, on_report),
        Operation::Roundtrip {
            count,
            output,
            modification,
        } => {
            harness.generate(*count, output, &mut rng, on_report)?;
            harness.perf(output, modification, on_report)
        }
    }
}
