// In-process document store backend.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::store::{Document, DocumentStore, StoreError, UpdateMode, document_key};

/// A single collection of documents held in process memory.
///
/// Every request optionally sleeps for a fixed latency before it is applied, to stand in for the
/// round trip to a remote store. Each request validates all of its documents before applying any
/// of them, so a failed request leaves the collection unchanged.
#[derive(Debug)]
pub(crate) struct MemoryStore {
    collection: String,
    latency: Duration,
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    pub(crate) fn new(collection: impl Into<String>, latency: Duration) -> Self {
        Self {
            collection: collection.into(),
            latency,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// The number of stored documents.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Simulates the round trip of one request and then locks the collection.
    fn request(&self) -> MutexGuard<'_, HashMap<String, Document>> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Document>> {
        self.documents
            .lock()
            .expect("no code panics while holding the collection lock, so it cannot be poisoned")
    }

    fn not_found(&self, key: &str) -> StoreError {
        StoreError::NotFound {
            collection: self.collection.clone(),
            key: key.to_string(),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn create_documents(&self, documents: &[Document]) -> Result<(), StoreError> {
        let mut stored = self.request();

        let mut keys = HashSet::with_capacity(documents.len());

        for document in documents {
            let key = document_key(document).ok_or(StoreError::MissingKey)?;

            if stored.contains_key(key) || !keys.insert(key) {
                return Err(StoreError::Conflict {
                    collection: self.collection.clone(),
                    key: key.to_string(),
                });
            }
        }

        for document in documents {
            let key = document_key(document).ok_or(StoreError::MissingKey)?;
            stored.insert(key.to_string(), document.clone());
        }

        Ok(())
    }

    fn read_documents(&self, keys: &[String]) -> Result<Vec<Document>, StoreError> {
        let stored = self.request();

        keys.iter()
            .map(|key| stored.get(key).cloned().ok_or_else(|| self.not_found(key)))
            .collect()
    }

    fn update_documents(
        &self,
        documents: &[Document],
        mode: UpdateMode,
    ) -> Result<(), StoreError> {
        let mut stored = self.request();

        for document in documents {
            let key = document_key(document).ok_or(StoreError::MissingKey)?;

            if !stored.contains_key(key) {
                return Err(self.not_found(key));
            }
        }

        for document in documents {
            let key = document_key(document).ok_or(StoreError::MissingKey)?;

            let Entry::Occupied(mut entry) = stored.entry(key.to_string()) else {
                return Err(self.not_found(key));
            };

            match mode {
                UpdateMode::Patch => {
                    let existing = entry.get_mut();

                    for (field, value) in document {
                        existing.insert(field.clone(), value.clone());
                    }
                }
                UpdateMode::Replace => {
                    entry.insert(document.clone());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Instant;

    use serde_json::{Value, json};

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn store_with(documents: &[Document]) -> MemoryStore {
        let store = MemoryStore::new("benchmark/benchmark", Duration::ZERO);
        store.create_documents(documents).unwrap();
        store
    }

    #[test]
    fn created_documents_can_be_read_in_key_order() {
        let store = store_with(&[
            doc(json!({ "_key": "a", "v": 1 })),
            doc(json!({ "_key": "b", "v": 2 })),
        ]);

        let read = store
            .read_documents(&["b".to_string(), "a".to_string()])
            .unwrap();

        assert_eq!(
            read,
            [
                doc(json!({ "_key": "b", "v": 2 })),
                doc(json!({ "_key": "a", "v": 1 }))
            ]
        );
    }

    #[test]
    fn duplicate_key_is_a_conflict_and_changes_nothing() {
        let store = store_with(&[doc(json!({ "_key": "a" }))]);

        let error = store
            .create_documents(&[doc(json!({ "_key": "b" })), doc(json!({ "_key": "a" }))])
            .unwrap_err();

        assert_eq!(
            error,
            StoreError::Conflict {
                collection: "benchmark/benchmark".to_string(),
                key: "a".to_string(),
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_key_within_one_request_is_a_conflict() {
        let store = store_with(&[]);

        let error = store
            .create_documents(&[doc(json!({ "_key": "a" })), doc(json!({ "_key": "a" }))])
            .unwrap_err();

        assert!(matches!(error, StoreError::Conflict { .. }));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn large_request_with_late_duplicate_is_a_conflict() {
        let store = store_with(&[]);

        let mut documents = (0..10_000)
            .map(|i| doc(json!({ "_key": format!("doc-{i}") })))
            .collect::<Vec<_>>();
        documents.push(doc(json!({ "_key": "doc-9999" })));

        let error = store.create_documents(&documents).unwrap_err();

        assert!(matches!(error, StoreError::Conflict { ref key, .. } if key == "doc-9999"));
        assert_eq!(store.len(), 0);

        documents.pop();
        store.create_documents(&documents).unwrap();

        assert_eq!(store.len(), 10_000);
    }

    #[test]
    fn keyless_document_is_rejected() {
        let store = store_with(&[]);

        let error = store
            .create_documents(&[doc(json!({ "v": 1 }))])
            .unwrap_err();

        assert_eq!(error, StoreError::MissingKey);
    }

    #[test]
    fn reading_missing_key_fails() {
        let store = store_with(&[doc(json!({ "_key": "a" }))]);

        let error = store
            .read_documents(&["a".to_string(), "zz".to_string()])
            .unwrap_err();

        assert_eq!(
            error,
            StoreError::NotFound {
                collection: "benchmark/benchmark".to_string(),
                key: "zz".to_string(),
            }
        );
    }

    #[test]
    fn patch_merges_fields() {
        let store = store_with(&[doc(json!({ "_key": "a", "keep": 1, "change": 1 }))]);

        store
            .update_documents(
                &[doc(json!({ "_key": "a", "change": 2, "add": 3 }))],
                UpdateMode::Patch,
            )
            .unwrap();

        let read = store.read_documents(&["a".to_string()]).unwrap();
        assert_eq!(
            read,
            [doc(json!({ "_key": "a", "keep": 1, "change": 2, "add": 3 }))]
        );
    }

    #[test]
    fn replace_drops_missing_fields() {
        let store = store_with(&[doc(json!({ "_key": "a", "keep": 1, "change": 1 }))]);

        store
            .update_documents(&[doc(json!({ "_key": "a", "change": 2 }))], UpdateMode::Replace)
            .unwrap();

        let read = store.read_documents(&["a".to_string()]).unwrap();
        assert_eq!(read, [doc(json!({ "_key": "a", "change": 2 }))]);
    }

    #[test]
    fn update_of_missing_document_changes_nothing() {
        let store = store_with(&[doc(json!({ "_key": "a", "v": 1 }))]);

        let error = store
            .update_documents(
                &[doc(json!({ "_key": "a", "v": 2 })), doc(json!({ "_key": "b", "v": 2 }))],
                UpdateMode::Patch,
            )
            .unwrap_err();

        assert!(matches!(error, StoreError::NotFound { ref key, .. } if key == "b"));

        let read = store.read_documents(&["a".to_string()]).unwrap();
        assert_eq!(read, [doc(json!({ "_key": "a", "v": 1 }))]);
    }

    #[test]
    fn latency_is_applied_per_request() {
        let store = MemoryStore::new("benchmark/benchmark", Duration::from_millis(20));

        let started = Instant::now();
        store.create_documents(&[doc(json!({ "_key": "a" }))]).unwrap();
        store.read_documents(&["a".to_string()]).unwrap();

        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
