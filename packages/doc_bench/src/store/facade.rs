// Facade that dispatches to either the in-memory store or a mock in tests.

use std::sync::Arc;

use crate::BenchConfig;
#[cfg(test)]
use crate::store::MockDocumentStore;
use crate::store::{Document, DocumentStore, MemoryStore, StoreError, UpdateMode};

/// Facade over the document store, dispatching to the real or mock implementation.
///
/// Cloning the facade shares the underlying store.
#[derive(Clone)]
pub(crate) enum StoreFacade {
    /// In-process store.
    Memory(Arc<MemoryStore>),

    /// Mock store for testing.
    #[cfg(test)]
    Mock(Arc<MockDocumentStore>),
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl std::fmt::Debug for StoreFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory(_) => f.debug_struct("StoreFacade::Memory").finish(),
            #[cfg(test)]
            Self::Mock(_) => f.debug_struct("StoreFacade::Mock").finish(),
        }
    }
}

impl StoreFacade {
    /// Creates an empty in-memory store for the configured collection.
    pub(crate) fn memory(config: &BenchConfig) -> Self {
        Self::Memory(Arc::new(MemoryStore::new(
            config.namespace(),
            config.latency(),
        )))
    }

    /// Creates a facade wrapping a mock store (test builds only).
    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockDocumentStore) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl DocumentStore for StoreFacade {
    fn create_documents(&self, documents: &[Document]) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.create_documents(documents),
            #[cfg(test)]
            Self::Mock(mock) => mock.create_documents(documents),
        }
    }

    fn read_documents(&self, keys: &[String]) -> Result<Vec<Document>, StoreError> {
        match self {
            Self::Memory(store) => store.read_documents(keys),
            #[cfg(test)]
            Self::Mock(mock) => mock.read_documents(keys),
        }
    }

    fn update_documents(
        &self,
        documents: &[Document],
        mode: UpdateMode,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.update_documents(documents, mode),
            #[cfg(test)]
            Self::Mock(mock) => mock.update_documents(documents, mode),
        }
    }
}
