//! Series store: owns one accumulated series, its snapshot location and version tag.
//!
//! Responsibilities:
//! - Create a fresh series stamped with the engine tag, or load one from a snapshot.
//! - Gate every append on the version tag, mirroring the on-load check.
//! - Drive extraction and fold the results into the series in file order.

mod ingest;
mod lifecycle;

use std::path::{Path, PathBuf};

pub use ingest::build_series_list;

use crate::io::SnapshotCodec;
use crate::merge::Series;

/// Handle over one series and where it persists.
#[derive(Debug)]
pub struct SeriesStore<S: Series> {
    series: S,
    path: Option<PathBuf>,
    codec: SnapshotCodec,
}

impl<S: Series> SeriesStore<S> {
    #[must_use]
    pub fn series(&self) -> &S {
        &self.series
    }

    #[must_use]
    pub fn into_series(self) -> S {
        self.series
    }

    /// Snapshot path this store saves to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn version_tag(&self) -> &str {
        &self.codec.config().version_tag
    }
}
