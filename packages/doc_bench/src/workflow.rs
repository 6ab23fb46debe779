// The harness operations, expressed as a sequence of bulk steps over one store.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use bulk_bench::{Batch, partition};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::Value;
use tracing::{info, trace};

use crate::store::{
    Document, DocumentStore, KEY_FIELD, Session, StoreFacade, UpdateMode, connect_sessions,
};
use crate::{BenchConfig, RunError, Step, StepReport, StoreError};

const RUN_ID_LEN: usize = 12;

/// Executes harness operations against one store, with one session per worker.
#[derive(Debug)]
pub(crate) struct Harness<'a> {
    config: &'a BenchConfig,
    sessions: Box<[Session]>,
}

impl<'a> Harness<'a> {
    pub(crate) fn new<R>(config: &'a BenchConfig, store: &StoreFacade, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            config,
            sessions: connect_sessions(config.threads, &config.endpoints, store, rng),
        }
    }

    /// Creates `count` new documents and writes their keys to `output`, one per line.
    ///
    /// The report of every completed step is passed to `on_report` as soon as the step ends.
    pub(crate) fn generate<R, O>(
        &self,
        count: usize,
        output: &Path,
        rng: &mut R,
        on_report: &mut O,
    ) -> Result<(), RunError>
    where
        R: Rng + ?Sized,
        O: FnMut(StepReport),
    {
        let run_id = run_id(rng);

        let keys = (0..count)
            .map(|i| format!("doc-{run_id}-{i}"))
            .collect::<Vec<_>>();

        let documents = keys.iter().map(|key| keyed(key)).collect::<Vec<_>>();

        on_report(self.run_step(Step::Create, documents.len(), |session, batch| {
            session.store().create_documents(batch.items(&documents))
        })?);

        fs::write(output, keys.join("\n")).map_err(|source| RunError::WriteKeys {
            path: output.to_path_buf(),
            source,
        })?;

        info!(count, output = %output.display(), "document keys written");

        Ok(())
    }

    /// Reads the documents listed in `keys_file`, merges `modification` into each of them and
    /// writes them back, first with PATCH and then with PUT semantics.
    ///
    /// The report of every completed step is passed to `on_report` as soon as the step ends.
    pub(crate) fn perf<O>(
        &self,
        keys_file: &Path,
        modification: &str,
        on_report: &mut O,
    ) -> Result<(), RunError>
    where
        O: FnMut(StepReport),
    {
        let modification = parse_modification(modification)?;
        let keys = read_keys(keys_file)?;

        let read = (0..keys.len())
            .map(|_| OnceLock::new())
            .collect::<Box<[OnceLock<Document>]>>();

        on_report(self.run_step(Step::Read, keys.len(), |session, batch| {
            let requested = batch.items(&keys);
            let documents = session.store().read_documents(requested)?;

            if documents.len() != requested.len() {
                return Err(StoreError::ShortRead {
                    requested: requested.len(),
                    returned: documents.len(),
                });
            }

            for (slot, document) in batch.items(&read).iter().zip(documents) {
                slot.set(document)
                    .expect("every document index belongs to exactly one batch");
            }

            Ok(())
        })?);

        let documents = read
            .into_iter()
            .map(|slot| {
                let mut document = slot
                    .into_inner()
                    .expect("a successful read step fills every document index");
                merge(&mut document, &modification);
                document
            })
            .collect::<Vec<_>>();

        for (step, mode) in [
            (Step::Patch, UpdateMode::Patch),
            (Step::Replace, UpdateMode::Replace),
        ] {
            on_report(self.run_step(step, documents.len(), |session, batch| {
                session
                    .store()
                    .update_documents(batch.items(&documents), mode)
            })?);
        }

        Ok(())
    }

    /// Executes one bulk step over `item_count` items and renders its report.
    ///
    /// The step fails as a whole if any of its bulk requests fails.
    fn run_step<F>(
        &self,
        step: Step,
        item_count: usize,
        unit_of_work: F,
    ) -> Result<StepReport, RunError>
    where
        F: Fn(&Session, &Batch) -> Result<(), StoreError> + Sync,
    {
        let batches = partition(item_count, self.config.bulk)?;

        info!(%step, items = item_count, batches = batches.len(), "step started");

        let summary = batches.dispatch(self.config.threads, |worker, batch| {
            let session = self
                .sessions
                .get(worker)
                .expect("one session is opened per worker");

            trace!(worker, %batch, endpoint = ?session.endpoints().first(), "bulk request");

            unit_of_work(session, batch)
        })?;

        let report = summary.to_string();

        summary
            .into_result()
            .map_err(|source| RunError::Step { step, source })?;

        Ok(StepReport { step, report })
    }
}

fn run_id<R>(rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    (0..RUN_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect()
}

fn keyed(key: &str) -> Document {
    let mut document = Document::new();
    document.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
    document
}

/// Reads one key per line. Blank lines are skipped.
fn read_keys(path: &Path) -> Result<Vec<String>, RunError> {
    let contents = fs::read_to_string(path).map_err(|source| RunError::ReadKeys {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_modification(modification: &str) -> Result<Document, RunError> {
    match serde_json::from_str(modification).map_err(RunError::InvalidModification)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(RunError::ModificationNotObject),
    }
}

/// Merges the top-level fields of `modification` into `document`. The key is never changed.
fn merge(document: &mut Document, modification: &Document) {
    for (field, value) in modification {
        if field != KEY_FIELD {
            document.insert(field.clone(), value.clone());
        }
    }
}
