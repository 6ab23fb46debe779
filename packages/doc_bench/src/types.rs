// Public API types for doc_bench.
//
// These types are used by main.rs and exposed via the crate's public API.

use std::fmt;
use std::path::PathBuf;

use bulk_bench::BatchError;
use thiserror::Error;

use crate::{BenchConfig, ConfigError, StoreError};

/// The harness operation to perform.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Operation {
    /// Create `count` new documents and write their keys to `output`.
    Generate {
        /// Number of documents to create.
        count: usize,
        /// File that receives the created keys, one per line.
        output: PathBuf,
    },

    /// Read the documents listed in `keys_file`, apply `modification` and write them back.
    Perf {
        /// File with one document key per line.
        keys_file: PathBuf,
        /// JSON object merged into every document.
        modification: String,
    },

    /// Generate followed by perf over the generated keys, against the same store.
    Roundtrip {
        /// Number of documents to create.
        count: usize,
        /// File that receives the created keys, one per line.
        output: PathBuf,
        /// JSON object merged into every document.
        modification: String,
    },
}

/// Input parameters for the `run` function.
///
/// This is the parsed and validated input that the core logic operates on.
#[doc(hidden)]
#[derive(Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "This is a hidden struct for internal/test use only"
)]
pub struct RunInput {
    /// Effective configuration.
    pub config: BenchConfig,
    /// The operation to perform.
    pub operation: Operation,
}

/// One bulk phase of a harness operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Step {
    /// Bulk creation of new documents.
    Create,
    /// Bulk read of existing documents.
    Read,
    /// Bulk update that merges fields into existing documents.
    Patch,
    /// Bulk update that replaces existing documents.
    Replace,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "Creating documents"),
            Self::Read => write!(f, "Reading documents"),
            Self::Patch => write!(f, "Updating documents with PATCH"),
            Self::Replace => write!(f, "Updating documents with PUT"),
        }
    }
}

/// The throughput report of one successfully completed step.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain result record, adding fields is a breaking change anyway"
)]
pub struct StepReport {
    /// The step that was executed.
    pub step: Step,
    /// The four-line throughput report of the step.
    pub report: String,
}

/// Errors that can occur during a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The bulk run could not be set up.
    #[error("cannot dispatch bulk requests: {0}")]
    Dispatch(#[from] bulk_bench::Error),

    /// A bulk request of a step failed. The whole step is considered failed.
    #[error("{step} failed: {source}")]
    Step {
        /// The step that failed.
        step: Step,
        /// The failure of the lowest failing batch.
        source: BatchError<StoreError>,
    },

    /// The document keys could not be read.
    #[error("cannot read document keys from {}: {source}", .path.display())]
    ReadKeys {
        /// The keys file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document keys could not be written.
    #[error("cannot write document keys to {}: {source}", .path.display())]
    WriteKeys {
        /// The keys file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The modification is not valid JSON.
    #[error("invalid modification: {0}")]
    InvalidModification(#[source] serde_json::Error),

    /// The modification is valid JSON but not an object.
    #[error("modification must be a JSON object")]
    ModificationNotObject,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(RunError: Send, Sync, Debug);

    #[test]
    fn step_names_match_report_headings() {
        assert_eq!(Step::Create.to_string(), "Creating documents");
        assert_eq!(Step::Read.to_string(), "Reading documents");
        assert_eq!(Step::Patch.to_string(), "Updating documents with PATCH");
        assert_eq!(Step::Replace.to_string(), "Updating documents with PUT");
    }

    #[test]
    fn configuration_errors_pass_through() {
        let error = RunError::from(ConfigError::ZeroThreads);

        assert_eq!(error.to_string(), "threads must be at least 1");
    }
}
