// Store trait abstraction for mocking in tests.

use std::fmt::Debug;

use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: a JSON object identified by its `_key` field.
pub(crate) type Document = Map<String, Value>;

/// The field that holds the key of a document.
pub(crate) const KEY_FIELD: &str = "_key";

/// Returns the key of a document, if it has a string key.
pub(crate) fn document_key(document: &Document) -> Option<&str> {
    document.get(KEY_FIELD).and_then(Value::as_str)
}

/// How an update request treats the fields of the stored document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum UpdateMode {
    /// Merge the given top-level fields into the stored document (HTTP PATCH).
    Patch,

    /// Replace the stored document with the given one (HTTP PUT).
    Replace,
}

/// Bulk document operations used by the harness.
///
/// Each call is one bulk request and either applies to all given documents or fails as a whole.
///
/// This trait is automatically mocked by mockall in test builds, generating `MockDocumentStore`.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait DocumentStore: Debug + Send + Sync + 'static {
    /// Creates new documents. Fails if any document lacks a key or its key already exists.
    fn create_documents(&self, documents: &[Document]) -> Result<(), StoreError>;

    /// Reads the documents with the given keys, returned in the same order as the keys.
    fn read_documents(&self, keys: &[String]) -> Result<Vec<Document>, StoreError>;

    /// Updates existing documents. Fails if any document lacks a key or does not exist.
    fn update_documents(&self, documents: &[Document], mode: UpdateMode)
    -> Result<(), StoreError>;
}

/// Errors returned by a document store for one bulk request.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum StoreError {
    /// A document with the same key already exists.
    #[error("document {key} already exists in {collection}")]
    Conflict {
        /// The `<database>/<collection>` the request was made against.
        collection: String,

        /// The conflicting key.
        key: String,
    },

    /// No document with the key exists.
    #[error("document {key} not found in {collection}")]
    NotFound {
        /// The `<database>/<collection>` the request was made against.
        collection: String,

        /// The missing key.
        key: String,
    },

    /// A document in the request has no string `_key` field.
    #[error("document has no string `_key` field")]
    MissingKey,

    /// The store answered a read request with a different number of documents than requested.
    #[error("requested {requested} documents but {returned} were returned")]
    ShortRead {
        /// How many keys were requested.
        requested: usize,

        /// How many documents were returned.
        returned: usize,
    },
}
