//! Merge engines folding parsed cycle records into an accumulated series.
//!
//! Both variants apply records strictly in arrival order and share one overlap rule: a
//! record at sort-key value `t` evicts every stored entry with a greater key, replaces an
//! entry with exactly `t`, and is appended otherwise. Every check that can fail runs
//! before the series is touched, so a rejected record leaves no partial state behind.

mod columnar;
mod problem;
mod tally;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use problem::reconcile_problem_data;

use crate::error::Result;
use crate::types::{
    ColumnarSeries, CycleRecord, RunManifest, SeriesKind, SeriesSummary, TallySeries,
};

/// Where an incoming entry lands after stale tail entries are evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Overwrite the entry at this index; the series keeps its length.
    Replace(usize),
    /// Push after the (possibly truncated) tail.
    Append,
}

/// Resolve overlap against an ascending key column.
///
/// Returns how many leading entries survive and where the new entry goes. Walks back
/// from the tail: greater keys are evicted, an equal key is replaced, a smaller key stops
/// the scan.
pub(crate) fn place(keys: &[f64], t_new: f64) -> (usize, Placement) {
    let mut keep = keys.len();
    while keep > 0 {
        let existing = keys[keep - 1];
        if existing > t_new {
            keep -= 1;
        } else if existing == t_new {
            return (keep, Placement::Replace(keep - 1));
        } else {
            break;
        }
    }
    (keep, Placement::Append)
}

/// Behaviour shared by the columnar and tally series.
pub trait Series: Serialize + DeserializeOwned + Send + Sized {
    /// Layout tag written into snapshot headers.
    const KIND: SeriesKind;

    /// Empty series stamped with an engine version tag.
    fn with_version(version: &str) -> Self;

    fn manifest(&self) -> &RunManifest;

    fn manifest_mut(&mut self) -> &mut RunManifest;

    /// Fold one record into the series.
    fn merge_cycle(&mut self, record: &CycleRecord, sort_key: &str) -> Result<()>;

    /// Describe the current contents.
    fn summary(&self, sort_key: &str) -> SeriesSummary;

    /// Fold records in order, stopping at the first failure. Records merged before the
    /// failure stay merged.
    fn merge_records<'r, I>(&mut self, records: I, sort_key: &str) -> Result<usize>
    where
        I: IntoIterator<Item = &'r CycleRecord>,
    {
        let mut merged = 0;
        for record in records {
            self.merge_cycle(record, sort_key)?;
            merged += 1;
        }
        Ok(merged)
    }
}

impl Series for ColumnarSeries {
    const KIND: SeriesKind = SeriesKind::Columnar;

    fn with_version(version: &str) -> Self {
        Self::new(version)
    }

    fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    fn manifest_mut(&mut self) -> &mut RunManifest {
        &mut self.manifest
    }

    fn merge_cycle(&mut self, record: &CycleRecord, sort_key: &str) -> Result<()> {
        ColumnarSeries::merge_cycle(self, record, sort_key)
    }

    fn summary(&self, sort_key: &str) -> SeriesSummary {
        ColumnarSeries::summary(self, sort_key)
    }
}

impl Series for TallySeries {
    const KIND: SeriesKind = SeriesKind::Tally;

    fn with_version(version: &str) -> Self {
        Self::new(version)
    }

    fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    fn manifest_mut(&mut self) -> &mut RunManifest {
        &mut self.manifest
    }

    fn merge_cycle(&mut self, record: &CycleRecord, sort_key: &str) -> Result<()> {
        TallySeries::merge_cycle(self, record, sort_key)
    }

    fn summary(&self, sort_key: &str) -> SeriesSummary {
        TallySeries::summary(self, sort_key)
    }
}
