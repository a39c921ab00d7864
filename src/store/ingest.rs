//! Appending log files to a series.

use std::path::Path;

use super::SeriesStore;
use crate::constants::APPEND_DATE_FORMAT;
use crate::error::{Result, SimlogError};
use crate::extract::{ExtractionCoordinator, file_identifier};
use crate::merge::Series;
use crate::progress::ProgressSink;
use crate::reader::RecordExtractor;
use crate::types::{CycleRecord, IngestOptions, SeriesSummary, SnapshotConfig};

impl<S: Series> SeriesStore<S> {
    /// Merge already-parsed records in order. Records merged before a failure stay merged.
    pub fn merge_records<'r, I>(&mut self, records: I, sort_key: &str) -> Result<usize>
    where
        I: IntoIterator<Item = &'r CycleRecord>,
    {
        self.ensure_version()?;
        self.series.merge_records(records, sort_key)
    }

    /// Extract `files` and fold their records into the series in file order.
    ///
    /// Each file is recorded in the run manifest once its records are merged. Records are
    /// merged batch by batch as the coordinator hands them over, so memory stays bounded
    /// by one batch of parsed files.
    pub fn append_files<E, P>(
        &mut self,
        files: &[P],
        extractor: &E,
        options: &IngestOptions,
        progress: &dyn ProgressSink,
    ) -> Result<SeriesSummary>
    where
        E: RecordExtractor + ?Sized,
        P: AsRef<Path> + Sync,
    {
        self.ensure_version()?;
        let sort_key = extractor.sort_key();
        let stamp = options
            .append_date
            .then(|| chrono::Local::now().format(APPEND_DATE_FORMAT).to_string());

        let series = &mut self.series;
        let mut merged = 0usize;
        ExtractionCoordinator::new(extractor)
            .workers(options.workers)
            .progress(progress)
            .label(options.progress_label.as_str())
            .fields(options.fields.as_ref())
            .run_with(files, |file| {
                merged += series.merge_records(&file.records, sort_key)?;
                let identifier = file.identifier();
                let identifier = match &stamp {
                    Some(stamp) => format!("{identifier}.{stamp}"),
                    None => identifier,
                };
                series.manifest_mut().record_file(identifier);
                Ok(())
            })?;

        let summary = self.series.summary(sort_key);
        tracing::info!(
            target = "simlog::ingest",
            kind = %S::KIND,
            files = files.len(),
            records = merged,
            "ingest complete"
        );
        tracing::debug!(target = "simlog::ingest", "\n{}", summary.to_text());
        Ok(summary)
    }
}

/// Build one fresh series per file list, named after the first file of each list.
pub fn build_series_list<S, E, P>(
    file_lists: &[Vec<P>],
    extractor: &E,
    options: &IngestOptions,
    progress: &dyn ProgressSink,
    config: &SnapshotConfig,
) -> Result<Vec<(String, S)>>
where
    S: Series,
    E: RecordExtractor + ?Sized,
    P: AsRef<Path> + Sync,
{
    file_lists
        .iter()
        .map(|files| {
            let first = files.first().ok_or_else(|| SimlogError::InvalidConfig {
                reason: "cannot name a series built from an empty file list".into(),
            })?;
            let name = file_identifier(first.as_ref());
            let mut store = SeriesStore::<S>::create(config.clone());
            store.append_files(files, extractor, options, progress)?;
            Ok((name, store.into_series()))
        })
        .collect()
}
