//! Extraction coordinator: chunk and parse a list of log files, optionally across a
//! bounded pool of worker threads.
//!
//! Files are processed in consecutive batches of `workers` files, one thread per file.
//! A batch fully joins before the next one starts, and every worker reports into the slot
//! matching its offset in the batch, so the output order is always the input order no
//! matter which worker finishes first. Workers share nothing mutable: each gets its path
//! plus shared references to the (immutable) extractor and field filter.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::constants::DEFAULT_PROGRESS_LABEL;
use crate::error::{Result, SimlogError};
use crate::progress::{NoProgress, ProgressSink};
use crate::reader::{RecordExtractor, chunk_file};
use crate::types::{CycleRecord, WorkerCount};

/// Records parsed from one file, in chunk order.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecords {
    pub path: PathBuf,
    pub records: Vec<CycleRecord>,
}

impl FileRecords {
    /// Final path component, used as the provenance identifier.
    #[must_use]
    pub fn identifier(&self) -> String {
        file_identifier(&self.path)
    }
}

pub(crate) fn file_identifier(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Chunk one file and run every span through the extractor.
pub fn extract_file<E>(path: &Path, extractor: &E) -> Result<Vec<CycleRecord>>
where
    E: RecordExtractor + ?Sized,
{
    extract_file_filtered(path, extractor, None)
}

/// Like [`extract_file`], keeping only the sub-table fields in `fields` when given.
#[instrument(target = "simlog::extract", skip_all, fields(file = %path.display()))]
pub fn extract_file_filtered<E>(
    path: &Path,
    extractor: &E,
    fields: Option<&BTreeSet<String>>,
) -> Result<Vec<CycleRecord>>
where
    E: RecordExtractor + ?Sized,
{
    let spans = chunk_file(path, extractor.markers())?;
    let records = spans
        .iter()
        .enumerate()
        .map(|(index, span)| -> Result<CycleRecord> {
            let mut record = extractor.parse_record(span).map_err(|source| {
                SimlogError::ExtractionFailed {
                    path: path.to_path_buf(),
                    index,
                    source: Box::new(source),
                }
            })?;
            if let Some(fields) = fields {
                record.retain_fields(fields);
            }
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(
        target = "simlog::extract",
        extractor = extractor.name(),
        records = records.len(),
        filtered = fields.is_some(),
        "file extracted"
    );
    Ok(records)
}

/// Fans a file list out to workers and hands results back in input order.
pub struct ExtractionCoordinator<'a, E: ?Sized> {
    extractor: &'a E,
    workers: WorkerCount,
    progress: &'a dyn ProgressSink,
    label: String,
    fields: Option<&'a BTreeSet<String>>,
}

impl<'a, E> ExtractionCoordinator<'a, E>
where
    E: RecordExtractor + ?Sized,
{
    #[must_use]
    pub fn new(extractor: &'a E) -> Self {
        Self {
            extractor,
            workers: WorkerCount::Sequential,
            progress: &NoProgress,
            label: DEFAULT_PROGRESS_LABEL.to_string(),
            fields: None,
        }
    }

    #[must_use]
    pub fn workers(mut self, workers: WorkerCount) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }

    /// Keep only these sub-table fields in every extracted record.
    #[must_use]
    pub fn fields(mut self, fields: Option<&'a BTreeSet<String>>) -> Self {
        self.fields = fields;
        self
    }

    /// Extract every file and collect the results, one entry per input file.
    pub fn run<P>(&self, files: &[P]) -> Result<Vec<FileRecords>>
    where
        P: AsRef<Path> + Sync,
    {
        let mut collected = Vec::with_capacity(files.len());
        self.run_with(files, |file| {
            collected.push(file);
            Ok(())
        })?;
        Ok(collected)
    }

    /// Extract every file and hand each result to `on_file` in input order.
    ///
    /// With a worker pool, `on_file` is called for a whole batch once it has joined, so
    /// at most one batch of parsed records is held at a time. An error from `on_file`
    /// stops the run.
    pub fn run_with<P, F>(&self, files: &[P], on_file: F) -> Result<()>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(FileRecords) -> Result<()>,
    {
        let workers = self.workers.resolve();
        tracing::info!(
            target = "simlog::extract",
            files = files.len(),
            workers,
            extractor = self.extractor.name(),
            "extracting records"
        );
        if workers == 0 {
            self.run_sequential(files, on_file)
        } else {
            self.run_batched(files, workers, on_file)
        }
    }

    fn run_sequential<P, F>(&self, files: &[P], mut on_file: F) -> Result<()>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(FileRecords) -> Result<()>,
    {
        let total = files.len();
        for (done, path) in files.iter().enumerate() {
            let path = path.as_ref();
            let records = extract_file_filtered(path, self.extractor, self.fields)?;
            self.progress.on_progress(done + 1, total, &self.label);
            on_file(FileRecords {
                path: path.to_path_buf(),
                records,
            })?;
        }
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn run_batched<P, F>(&self, files: &[P], _workers: usize, on_file: F) -> Result<()>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(FileRecords) -> Result<()>,
    {
        self.run_sequential(files, on_file)
    }

    #[cfg(feature = "parallel")]
    fn run_batched<P, F>(&self, files: &[P], workers: usize, mut on_file: F) -> Result<()>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(FileRecords) -> Result<()>,
    {
        let total = files.len();
        let mut completed = 0;
        for (batch_index, batch) in files.chunks(workers).enumerate() {
            tracing::debug!(
                target = "simlog::extract",
                batch = batch_index,
                size = batch.len(),
                "starting batch"
            );
            let results = self.extract_batch(batch, total, &mut completed)?;
            for file in results {
                on_file(file)?;
            }
        }
        Ok(())
    }

    /// Run one batch to completion, then resolve its slots in input order.
    #[cfg(feature = "parallel")]
    fn extract_batch<P>(
        &self,
        batch: &[P],
        total: usize,
        completed: &mut usize,
    ) -> Result<Vec<FileRecords>>
    where
        P: AsRef<Path> + Sync,
    {
        type SlotResult = Result<Vec<CycleRecord>>;

        let extractor = self.extractor;
        let fields = self.fields;
        let mut slots: Vec<Option<SlotResult>> = (0..batch.len()).map(|_| None).collect();

        let failures: Vec<Option<String>> = std::thread::scope(|scope| {
            let (tx, rx) = crossbeam_channel::bounded::<(usize, SlotResult)>(batch.len());
            let handles: Vec<_> = batch
                .iter()
                .enumerate()
                .map(|(slot, path)| {
                    let tx = tx.clone();
                    let path = path.as_ref();
                    std::thread::Builder::new()
                        .name(format!("simlog-extract-{slot}"))
                        .spawn_scoped(scope, move || {
                            let result = extract_file_filtered(path, extractor, fields);
                            tx.send((slot, result)).ok();
                        })
                })
                .collect();
            drop(tx);

            for (slot, result) in rx.iter() {
                slots[slot] = Some(result);
                *completed += 1;
                self.progress.on_progress(*completed, total, &self.label);
            }

            handles
                .into_iter()
                .map(|handle| match handle {
                    Ok(handle) => handle.join().err().map(panic_message),
                    Err(err) => Some(format!("failed to spawn worker: {err}")),
                })
                .collect()
        });

        let mut files = Vec::with_capacity(batch.len());
        for ((path, slot), failure) in batch.iter().zip(slots).zip(failures) {
            let path = path.as_ref().to_path_buf();
            if let Some(reason) = failure {
                tracing::error!(
                    target = "simlog::extract",
                    file = %path.display(),
                    reason = %reason,
                    "extraction worker failed"
                );
                return Err(SimlogError::WorkerFailure { path, reason });
            }
            match slot {
                Some(Ok(records)) => files.push(FileRecords { path, records }),
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(SimlogError::WorkerFailure {
                        path,
                        reason: "worker exited without producing output".into(),
                    });
                }
            }
        }
        Ok(files)
    }
}

#[cfg(feature = "parallel")]
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Collect per-file records for `files` using `extractor`.
pub fn extract_files<E, P>(
    files: &[P],
    extractor: &E,
    workers: WorkerCount,
    progress: &dyn ProgressSink,
) -> Result<Vec<FileRecords>>
where
    E: RecordExtractor + ?Sized,
    P: AsRef<Path> + Sync,
{
    ExtractionCoordinator::new(extractor)
        .workers(workers)
        .progress(progress)
        .run(files)
}

/// Like [`extract_files`] but streams each file's records to `on_file` in input order.
pub fn extract_files_with<E, P, F>(
    files: &[P],
    extractor: &E,
    workers: WorkerCount,
    progress: &dyn ProgressSink,
    on_file: F,
) -> Result<()>
where
    E: RecordExtractor + ?Sized,
    P: AsRef<Path> + Sync,
    F: FnMut(FileRecords) -> Result<()>,
{
    ExtractionCoordinator::new(extractor)
        .workers(workers)
        .progress(progress)
        .run_with(files, on_file)
}
